//! DeTEnGA evidence merging and stats
//!
//! Combines two independent signals per transcript: the Pfam-domain
//! classification of its protein (InterProScan) and a transposon-domain hit
//! on its mRNA (TEsorter). The cross of {coding, transposable-element,
//! mixed, none} x {TE hit, none} yields exactly one of seven categories.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::engine::result::{MetricsRow, MetricValue, StageReport};
use crate::parsers::round2;

/// Category codes in report order.
pub const CATEGORIES: [&str; 7] = [
    "PcpM0", "PteM0", "PchM0", "PcpMte", "PteMte", "PchMte", "P0Mte",
];

/// Protein-side classification from the Pfam domains found on a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterproStatus {
    CodingSequence,
    TransposableElement,
    Mixed,
}

impl InterproStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterproStatus::CodingSequence => "coding_sequence",
            InterproStatus::TransposableElement => "transposable_element",
            InterproStatus::Mixed => "mixed",
        }
    }
}

/// One Pfam match from the InterProScan table.
#[derive(Debug, Clone)]
pub struct PfamHit {
    pub code: String,
    pub description: String,
    pub start: i64,
    pub end: i64,
    /// True when the accession appears in the rexdb transposon-Pfam table.
    pub te: bool,
}

/// One transcript row of the TEsorter `.cls.tsv` table.
#[derive(Debug, Clone)]
pub struct TeSorterHit {
    pub domains: String,
    pub complete: String,
    /// `Order|Superfamily|Clade`.
    pub classification: String,
    pub strand: String,
}

/// One line of the merged `{ID}_TE_summary.csv`.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub transcript: String,
    pub interpro_status: Option<InterproStatus>,
    pub pfam_ids: String,
    pub pfam_descriptions: String,
    pub tesorter: Option<TeSorterHit>,
    pub status: &'static str,
}

/// Load the two-column `PFxxxxx  description` transposon-Pfam table.
pub fn load_te_pfams(path: &Path) -> std::io::Result<HashSet<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut pfams = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') {
            continue;
        }
        if let Some(code) = line.split_whitespace().next() {
            pfams.insert(code.to_string());
        }
    }
    Ok(pfams)
}

/// Extract significant Pfam matches per transcript from the InterProScan
/// TSV, tagging each with its transposon status. Matches are ordered by
/// start coordinate; rows that do not parse are skipped.
pub fn pfams_from_interpro(
    path: &Path,
    te_pfams: &HashSet<String>,
) -> std::io::Result<BTreeMap<String, Vec<PfamHit>>> {
    const MAX_EVALUE: f64 = 0.005;
    let reader = BufReader::new(File::open(path)?);
    let mut genes: BTreeMap<String, Vec<PfamHit>> = BTreeMap::new();
    for line in reader.lines() {
        let line = line?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 || fields[3] != "Pfam" {
            continue;
        }
        let evalue: f64 = match fields[8].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        if evalue > MAX_EVALUE {
            continue;
        }
        let (start, end) = match (fields[6].parse(), fields[7].parse()) {
            (Ok(s), Ok(e)) => (s, e),
            _ => continue,
        };
        let code = fields[4].to_string();
        genes.entry(fields[0].to_string()).or_default().push(PfamHit {
            te: te_pfams.contains(&code),
            code,
            description: fields[5].to_string(),
            start,
            end,
        });
    }
    for hits in genes.values_mut() {
        hits.sort_by_key(|hit| hit.start);
    }
    Ok(genes)
}

/// Read the TEsorter classification table (`#TE` keyed, tab-delimited).
pub fn parse_tesorter_table(path: &Path) -> std::io::Result<HashMap<String, TeSorterHit>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Ok(HashMap::new()),
    };
    let columns: Vec<&str> = header.trim_end().split('\t').collect();
    let index = |name: &str| columns.iter().position(|col| *col == name);
    let (te, order, superfamily, clade, complete, strand, domains) = match (
        index("#TE"),
        index("Order"),
        index("Superfamily"),
        index("Clade"),
        index("Complete"),
        index("Strand"),
        index("Domains"),
    ) {
        (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f), Some(g)) => {
            (a, b, c, d, e, f, g)
        }
        _ => return Ok(HashMap::new()),
    };

    let mut output = HashMap::new();
    for line in lines {
        let line = line?;
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or("").to_string();
        if fields.len() <= te {
            continue;
        }
        output.insert(
            field(te),
            TeSorterHit {
                domains: field(domains),
                complete: field(complete),
                classification: format!(
                    "{}|{}|{}",
                    field(order),
                    field(superfamily),
                    field(clade)
                ),
                strand: field(strand),
            },
        );
    }
    Ok(output)
}

/// Assign the one category a transcript belongs to. The InterProScan
/// protein classification and the TEsorter mRNA hit are independent axes;
/// both always contribute, they never override each other.
pub fn detenga_status(
    interpro: Option<InterproStatus>,
    has_mrna_te: bool,
) -> &'static str {
    match (interpro, has_mrna_te) {
        (Some(InterproStatus::CodingSequence), false) => "PcpM0",
        (Some(InterproStatus::TransposableElement), false) => "PteM0",
        (Some(InterproStatus::Mixed), false) => "PchM0",
        (Some(InterproStatus::CodingSequence), true) => "PcpMte",
        (Some(InterproStatus::TransposableElement), true) => "PteMte",
        (Some(InterproStatus::Mixed), true) => "PchMte",
        (None, true) => "P0Mte",
        (None, false) => "NA",
    }
}

/// Merge both evidence tables into summary rows: one per transcript seen by
/// InterProScan, then one per transcript only TEsorter reported.
pub fn build_summary(
    interpro: &BTreeMap<String, Vec<PfamHit>>,
    tesorter: &HashMap<String, TeSorterHit>,
) -> Vec<SummaryRow> {
    let mut summary = Vec::new();
    for (transcript, hits) in interpro {
        let transposable = hits.iter().any(|hit| hit.te);
        let coding = hits.iter().any(|hit| !hit.te);
        let status = match (transposable, coding) {
            (true, false) => InterproStatus::TransposableElement,
            (false, true) => InterproStatus::CodingSequence,
            _ => InterproStatus::Mixed,
        };
        let hit = tesorter.get(transcript).cloned();
        summary.push(SummaryRow {
            transcript: transcript.clone(),
            interpro_status: Some(status),
            pfam_ids: hits
                .iter()
                .map(|h| h.code.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            pfam_descriptions: hits
                .iter()
                .map(|h| h.description.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            status: detenga_status(Some(status), hit.is_some()),
            tesorter: hit,
        });
    }
    let mut tesorter_only: Vec<&String> = tesorter
        .keys()
        .filter(|transcript| !interpro.contains_key(*transcript))
        .collect();
    tesorter_only.sort();
    for transcript in tesorter_only {
        let hit = tesorter.get(transcript).cloned();
        summary.push(SummaryRow {
            transcript: transcript.clone(),
            interpro_status: None,
            pfam_ids: "NA".to_string(),
            pfam_descriptions: "NA".to_string(),
            status: detenga_status(None, hit.is_some()),
            tesorter: hit,
        });
    }
    summary
}

/// Write the `;`-delimited summary table.
pub fn write_summary(summary: &[SummaryRow], out: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(out)?);
    writeln!(
        writer,
        "Transcript_ID;Interpro_status;TEsort_class;PFAM_domains;\
         PFAM_descriptions;TEsort_domains;TEsort_completness;TEsort_strand;DeTEnGA_status"
    )?;
    for row in summary {
        let interpro = row
            .interpro_status
            .map(|status| status.as_str())
            .unwrap_or("NA");
        let (class, domains, complete, strand) = match &row.tesorter {
            Some(hit) => (
                hit.classification.as_str(),
                hit.domains.as_str(),
                hit.complete.as_str(),
                hit.strand.as_str(),
            ),
            None => ("NA", "NA", "NA", "NA"),
        };
        writeln!(
            writer,
            "{};{};{};{};{};{};{};{};{}",
            row.transcript,
            interpro,
            class,
            row.pfam_ids,
            // Pfam descriptions may themselves contain the delimiter.
            row.pfam_descriptions.replace(';', ","),
            domains,
            complete,
            strand,
            row.status
        )?;
    }
    writer.flush()
}

fn composite(total: &str, values: &[String]) -> String {
    let mut parts = vec![format!("T: {}", total)];
    for (code, value) in CATEGORIES.iter().zip(values) {
        parts.push(format!("{}: {}", code, value));
    }
    parts.join(";")
}

/// Stats over the written summary: per-category counts and percentages of
/// the total transcript count, folded into two composite report fields.
pub fn detenga_stats(report: &StageReport, transcripts: i64) -> MetricsRow {
    let mut row = MetricsRow::new();
    let summary_path = report
        .get("summary")
        .filter(|step| !step.is_failed())
        .and_then(|step| step.output.clone());

    let failed = report.any_failed() || summary_path.is_none();
    let readable = summary_path.as_ref().filter(|path| path.is_file());
    if failed || readable.is_none() {
        row.insert("DETENGA_FPV", MetricValue::failed());
        row.insert("DETENGA_FP%", MetricValue::failed());
        return row;
    }

    let mut counts: HashMap<&str, i64> = HashMap::new();
    if let Some(path) = readable {
        if let Ok(file) = File::open(path) {
            for line in BufReader::new(file).lines().skip(1).map_while(Result::ok) {
                if let Some(status) = line.trim_end().rsplit(';').next() {
                    if let Some(code) = CATEGORIES.iter().find(|c| **c == status) {
                        *counts.entry(*code).or_insert(0) += 1;
                    }
                }
            }
        }
    }

    let values: Vec<String> = CATEGORIES
        .iter()
        .map(|code| counts.get(code).copied().unwrap_or(0).to_string())
        .collect();
    let percentages: Vec<String> = CATEGORIES
        .iter()
        .map(|code| {
            let count = counts.get(code).copied().unwrap_or(0);
            let percent = if transcripts > 0 {
                round2(count as f64 / transcripts as f64 * 100.0)
            } else {
                0.0
            };
            percent.to_string()
        })
        .collect();

    let total = transcripts.to_string();
    row.insert("DETENGA_FPV", composite(&total, &values));
    row.insert("DETENGA_FP%", composite(&total, &percentages));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::{StepResult, StepStatus};
    use std::fs;
    use std::path::PathBuf;

    fn hit() -> TeSorterHit {
        TeSorterHit {
            domains: "RT GAG".to_string(),
            complete: "yes".to_string(),
            classification: "LTR|Copia|Ale".to_string(),
            strand: "+".to_string(),
        }
    }

    #[test]
    fn status_covers_all_seven_categories() {
        use InterproStatus::*;
        assert_eq!(detenga_status(Some(CodingSequence), false), "PcpM0");
        assert_eq!(detenga_status(Some(TransposableElement), false), "PteM0");
        assert_eq!(detenga_status(Some(Mixed), false), "PchM0");
        assert_eq!(detenga_status(Some(CodingSequence), true), "PcpMte");
        assert_eq!(detenga_status(Some(TransposableElement), true), "PteMte");
        assert_eq!(detenga_status(Some(Mixed), true), "PchMte");
        assert_eq!(detenga_status(None, true), "P0Mte");
        assert_eq!(detenga_status(None, false), "NA");
    }

    #[test]
    fn interpro_parse_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interpro.tsv");
        let te_pfams: HashSet<String> = ["PF07727".to_string()].into_iter().collect();
        fs::write(
            &path,
            "t1\tmd5\t300\tPfam\tPF00069\tKinase\t120\t250\t1e-30\tT\n\
             t1\tmd5\t300\tPfam\tPF07727\tRT\t10\t90\t1e-10\tT\n\
             t1\tmd5\t300\tPfam\tPF99999\tWeak\t5\t50\t0.5\tT\n\
             t2\tmd5\t100\tPANTHER\tPTHR1\tFamily\t1\t99\t1e-40\tT\n",
        )
        .unwrap();

        let genes = pfams_from_interpro(&path, &te_pfams).unwrap();
        assert_eq!(genes.len(), 1);
        let hits = &genes["t1"];
        // Weak e-value dropped, remaining ordered by start coordinate.
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].code, "PF07727");
        assert!(hits[0].te);
        assert_eq!(hits[1].code, "PF00069");
        assert!(!hits[1].te);
    }

    #[test]
    fn tesorter_parse_keys_by_te_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mrna.rexdb-plant.cls.tsv");
        fs::write(
            &path,
            "#TE\tOrder\tSuperfamily\tClade\tComplete\tStrand\tDomains\n\
             t9\tLTR\tCopia\tAle\tyes\t+\tRT GAG\n",
        )
        .unwrap();

        let table = parse_tesorter_table(&path).unwrap();
        let hit = &table["t9"];
        assert_eq!(hit.classification, "LTR|Copia|Ale");
        assert_eq!(hit.domains, "RT GAG");
    }

    #[test]
    fn summary_includes_tesorter_only_transcripts() {
        let mut interpro = BTreeMap::new();
        interpro.insert(
            "t1".to_string(),
            vec![PfamHit {
                code: "PF00069".to_string(),
                description: "Kinase".to_string(),
                start: 1,
                end: 100,
                te: false,
            }],
        );
        let mut tesorter = HashMap::new();
        tesorter.insert("t2".to_string(), hit());

        let summary = build_summary(&interpro, &tesorter);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].transcript, "t1");
        assert_eq!(summary[0].status, "PcpM0");
        assert_eq!(summary[1].transcript, "t2");
        assert_eq!(summary[1].status, "P0Mte");
    }

    fn summary_report(dir: &Path, body: &str) -> StageReport {
        let path = dir.join("TE_summary.csv");
        fs::write(&path, body).unwrap();
        let mut report = StageReport::new();
        report.push(
            "summary",
            StepResult {
                command: "merge".into(),
                status: StepStatus::Success("ok".into()),
                output: Some(path),
            },
        );
        report
    }

    #[test]
    fn one_transcript_per_category_yields_equal_percentages() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = String::from("Transcript_ID;...;DeTEnGA_status\n");
        for (i, code) in CATEGORIES.iter().enumerate() {
            body.push_str(&format!("t{};x;x;x;x;x;x;x;{}\n", i, code));
        }
        let report = summary_report(dir.path(), &body);

        let row = detenga_stats(&report, 7);
        let counts = row.get("DETENGA_FPV").unwrap().to_string();
        let percents = row.get("DETENGA_FP%").unwrap().to_string();

        assert_eq!(
            counts,
            "T: 7;PcpM0: 1;PteM0: 1;PchM0: 1;PcpMte: 1;PteMte: 1;PchMte: 1;P0Mte: 1"
        );
        for part in percents.split(';').skip(1) {
            let value: f64 = part.split(": ").nth(1).unwrap().parse().unwrap();
            assert!((value - 14.29).abs() < 1e-9, "{}", part);
        }
    }

    #[test]
    fn failed_stage_propagates_sentinels() {
        let mut report = StageReport::new();
        report.push(
            "tesorter",
            StepResult {
                command: "TEsorter".into(),
                status: StepStatus::Failed("exit 1".into()),
                output: None,
            },
        );
        let row = detenga_stats(&report, 100);
        assert_eq!(row.get("DETENGA_FPV").unwrap().to_string(), "FAILED");
        assert_eq!(row.get("DETENGA_FP%").unwrap().to_string(), "FAILED");
    }

    #[test]
    fn missing_summary_file_degrades_to_sentinels() {
        let mut report = StageReport::new();
        report.push(
            "summary",
            StepResult {
                command: "merge".into(),
                status: StepStatus::Success("ok".into()),
                output: Some(PathBuf::from("/nonexistent/TE_summary.csv")),
            },
        );
        let row = detenga_stats(&report, 10);
        assert_eq!(row.get("DETENGA_FPV").unwrap().to_string(), "FAILED");
    }
}
