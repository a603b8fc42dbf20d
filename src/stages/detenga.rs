//! DeTEnGA transposable-element screening stage
//!
//! Sub-step order matters: the mRNA set is filtered before TEsorter sees
//! it, the protein set is stripped of internal stop codons before
//! InterProScan sees it, and the summary merges both tool outputs.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{internal_step, run_step, RunOptions};
use crate::parsers::detenga::{
    build_summary, load_te_pfams, parse_tesorter_table, pfams_from_interpro, write_summary,
};

pub const STAGE_DIR: &str = "DETENGA_run";

/// mRNA records longer than this are dropped before TEsorter.
pub const MAX_MRNA_LEN: usize = 100_000;

/// InterProScan member databases excluded from the scan; only Pfam matters
/// for the classification.
const INTERPRO_EXCLUDE: [&str; 17] = [
    "AntiFam",
    "CDD",
    "Coils",
    "FunFam",
    "Gene3D",
    "Hamap",
    "MobiDBLite",
    "NCBIfam",
    "PANTHER",
    "PIRSF",
    "PIRSR",
    "PRINTS",
    "ProSitePatterns",
    "ProSiteProfiles",
    "SFLD",
    "SMART",
    "SUPERFAMILY",
];

pub async fn run_detenga(
    config: &PipelineConfig,
    protein_sequences: &Path,
    mrna_sequences: &Path,
) -> StageReport {
    let outdir = config.basedir.join(STAGE_DIR);
    let stem = config.assembly_stem();
    let mut report = StageReport::new();
    if let Err(e) = fs::create_dir_all(&outdir) {
        report.push(
            "filter_mrna",
            StepResult {
                command: String::new(),
                status: StepStatus::Failed(format!("Failed: \n {}", e)),
                output: None,
            },
        );
        return report;
    }

    // 1. mRNA filtering: TEsorter chokes on ambiguous bases and very long
    // records, so both are removed first.
    let filtered_mrna = outdir.join(format!("{}.mrna.filtered.fasta", stem));
    let filter = internal_step(
        "Filter mRNA records with ambiguous bases or excessive length",
        &filtered_mrna,
        || filter_mrna_records(mrna_sequences, &filtered_mrna),
    );
    let filter_failed = filter.is_failed();
    report.push("filter_mrna", filter);

    // 2. TEsorter writes its outputs relative to the child cwd, named after
    // the input file.
    let mrna_name = filtered_mrna
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let db = config.detenga_db.as_deref().unwrap_or("rexdb-plant");
    let tesorter_outfile = outdir.join(format!("{}.{}.cls.tsv", mrna_name, db));
    let cmd = format!(
        "TEsorter {} -db {} -p {}",
        filtered_mrna.display(),
        db,
        config.threads
    );
    let tesorter = if filter_failed {
        StepResult {
            command: cmd,
            status: StepStatus::Failed("Failed: mRNA filtering produced no input".to_string()),
            output: Some(tesorter_outfile.clone()),
        }
    } else {
        run_step(&cmd, &tesorter_outfile, &RunOptions::in_dir(&outdir)).await
    };
    report.push("tesorter", tesorter);

    // 3. Stop-codon stripping keeps InterProScan from rejecting proteins
    // with internal `*`/`.` symbols.
    let nostop = outdir.join(format!("{}.pep.nostop.fasta", stem));
    let length_log = outdir.join(format!("{}.stop_codons.log.txt", stem));
    let strip = internal_step("Remove internal stop codons", &nostop, || {
        strip_stop_codons(protein_sequences, &nostop, &length_log)
    });
    let strip_failed = strip.is_failed();
    report.push("stop_codons", strip);

    // 4. InterProScan, Pfam only.
    let nostop_name = nostop
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let interpro_outfile = outdir.join(format!("{}.tsv", nostop_name));
    let cmd = format!(
        "interproscan.sh -i {} -cpu {} -exclappl {} --disable-precalc",
        nostop.display(),
        config.threads,
        INTERPRO_EXCLUDE.join(",")
    );
    let interpro = if strip_failed {
        StepResult {
            command: cmd,
            status: StepStatus::Failed(
                "Failed: stop-codon stripping produced no input".to_string(),
            ),
            output: Some(interpro_outfile.clone()),
        }
    } else {
        run_step(
            &cmd,
            &interpro_outfile,
            &RunOptions {
                workdir: Some(outdir.clone()),
                diagnostics: crate::engine::step::DiagnosticStream::Stdout,
            },
        )
        .await
    };
    let interpro_failed = interpro.is_failed();
    report.push("interproscan", interpro);

    // 5. Merge both evidence tables into the summary the parser reads.
    let summary_out = outdir.join(format!("{}_TE_summary.csv", config.id));
    let tesorter_failed = report
        .get("tesorter")
        .map(|step| step.is_failed())
        .unwrap_or(true);
    let summary = if tesorter_failed || interpro_failed {
        StepResult {
            command: "Merge InterProScan and TEsorter evidence".to_string(),
            status: StepStatus::Failed("Failed: upstream DeTEnGA step failed".to_string()),
            output: Some(summary_out.clone()),
        }
    } else {
        let pfam_table = config.detenga_pfams.clone();
        internal_step(
            "Merge InterProScan and TEsorter evidence",
            &summary_out,
            || {
                merge_evidence(
                    pfam_table.as_deref(),
                    &interpro_outfile,
                    &tesorter_outfile,
                    &summary_out,
                )
            },
        )
    };
    report.push("summary", summary);

    report
}

fn merge_evidence(
    pfam_table: Option<&Path>,
    interpro: &Path,
    tesorter: &Path,
    out: &Path,
) -> std::io::Result<()> {
    let pfam_table = pfam_table.ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "DETENGA_pfams not configured")
    })?;
    let te_pfams = load_te_pfams(pfam_table)?;
    let interpro = pfams_from_interpro(interpro, &te_pfams)?;
    // TEsorter reports nothing at all when no transcript matches; treat a
    // missing table as an empty one.
    let tesorter = if tesorter.is_file() {
        parse_tesorter_table(tesorter)?
    } else {
        Default::default()
    };
    let summary = build_summary(&interpro, &tesorter);
    write_summary(&summary, out)
}

/// Copy `input` to `output`, dropping records that contain ambiguous bases
/// or exceed [`MAX_MRNA_LEN`]. Only one record is held in memory at a time.
pub fn filter_mrna_records(input: &Path, output: &Path) -> std::io::Result<()> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);

    let mut record: Vec<String> = Vec::new();
    let mut keep = true;
    let mut length = 0usize;

    fn flush(
        record: &mut Vec<String>,
        keep: bool,
        writer: &mut BufWriter<File>,
    ) -> std::io::Result<()> {
        if keep {
            for line in record.iter() {
                writeln!(writer, "{}", line)?;
            }
        }
        record.clear();
        Ok(())
    }

    for line in reader.lines() {
        let line = line?;
        if line.starts_with('>') {
            flush(&mut record, keep && length <= MAX_MRNA_LEN, &mut writer)?;
            keep = true;
            length = 0;
            record.push(line);
        } else {
            let seq = line.trim_end();
            length += seq.len();
            if seq.contains(['N', 'n']) {
                keep = false;
            }
            record.push(line);
        }
    }
    flush(&mut record, keep && length <= MAX_MRNA_LEN, &mut writer)?;
    writer.flush()
}

/// Truncate each protein at its first internal stop symbol (`.` or `*`),
/// writing a per-record `id<TAB>original<TAB>kept` length log. Operates
/// line by line; sequences are never loaded whole.
pub fn strip_stop_codons(input: &Path, output: &Path, log: &Path) -> std::io::Result<()> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    let mut log_writer = BufWriter::new(File::create(log)?);

    let mut id = String::new();
    let mut stopped = false;
    let mut original_len = 0usize;
    let mut new_len = 0usize;

    for line in reader.lines() {
        let line = line?;
        if let Some(header) = line.strip_prefix('>') {
            if !id.is_empty() {
                writeln!(log_writer, "{}\t{}\t{}", id, original_len, new_len)?;
            }
            id = header.trim_end().to_string();
            original_len = 0;
            new_len = 0;
            stopped = false;
            writeln!(writer, "{}", line)?;
        } else {
            let seq = line.trim_end();
            original_len += seq.len();
            if stopped {
                continue;
            }
            match seq.find(['.', '*']) {
                Some(position) => {
                    stopped = true;
                    if position > 0 {
                        writeln!(writer, "{}", &seq[..position])?;
                    }
                    new_len += position;
                }
                None => {
                    writeln!(writer, "{}", seq)?;
                    new_len += seq.len();
                }
            }
        }
    }
    if !id.is_empty() {
        writeln!(log_writer, "{}\t{}\t{}", id, original_len, new_len)?;
    }
    writer.flush()?;
    log_writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_and_filter(body: &str) -> String {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("mrna.fasta");
        let output = dir.path().join("filtered.fasta");
        fs::write(&input, body).unwrap();
        filter_mrna_records(&input, &output).unwrap();
        fs::read_to_string(&output).unwrap()
    }

    #[test]
    fn filter_drops_records_with_ambiguous_bases() {
        let out = write_and_filter(">t1\nACGT\n>t2\nACNT\n>t3\nacgt\n");
        assert!(out.contains(">t1"));
        assert!(!out.contains(">t2"));
        assert!(out.contains(">t3"));
    }

    #[test]
    fn filter_drops_oversized_records_and_keeps_order() {
        let long_seq = "A".repeat(MAX_MRNA_LEN + 1);
        let body = format!(">t1\nACGT\n>t2\n{}\n>t3\nGGGG\n", long_seq);
        let out = write_and_filter(&body);
        let headers: Vec<&str> = out.lines().filter(|l| l.starts_with('>')).collect();
        assert_eq!(headers, vec![">t1", ">t3"]);
    }

    #[test]
    fn filter_sums_length_across_lines() {
        // 2 lines of 60k = 120k total, above the cap even though each line
        // is below it.
        let half = "A".repeat(60_000);
        let body = format!(">t1\n{}\n{}\n>t2\nAC\n", half, half);
        let out = write_and_filter(&body);
        assert!(!out.contains(">t1"));
        assert!(out.contains(">t2"));
    }

    #[test]
    fn stop_codon_stripping_cuts_at_first_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pep.fasta");
        let output = dir.path().join("nostop.fasta");
        let log = dir.path().join("log.txt");
        // Stop symbol on the second line of the record.
        fs::write(&input, ">p1\nMKT\nAB*EXTRA\n>p2\nMML\n").unwrap();

        strip_stop_codons(&input, &output, &log).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            ">p1\nMKT\nAB\n>p2\nMML\n"
        );

        let log_text = fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = log_text.lines().collect();
        // p1: original 3+8=11, kept 3+2=5; dropped 6 = "*EXTRA".
        assert_eq!(lines[0], "p1\t11\t5");
        assert_eq!(lines[1], "p2\t3\t3");
    }

    #[test]
    fn stop_at_line_start_writes_no_empty_line() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pep.fasta");
        let output = dir.path().join("nostop.fasta");
        let log = dir.path().join("log.txt");
        fs::write(&input, ">p1\nMKT\n*TAIL\n").unwrap();

        strip_stop_codons(&input, &output, &log).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), ">p1\nMKT\n");
        assert!(fs::read_to_string(&log).unwrap().contains("p1\t8\t3"));
    }

    #[test]
    fn period_counts_as_stop_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pep.fasta");
        let output = dir.path().join("nostop.fasta");
        let log = dir.path().join("log.txt");
        fs::write(&input, ">p1\nMK.T\n").unwrap();

        strip_stop_codons(&input, &output, &log).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), ">p1\nMK\n");
    }
}
