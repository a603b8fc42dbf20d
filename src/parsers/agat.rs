//! AGAT report parsers

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::engine::result::{MetricValue, MetricsRow, StageReport};
use crate::parsers::{readable_output, round2};

/// Report label → metric name for the statistics file. Total gene length is
/// the one value converted (bp → Mb).
const STATS_MAPPING: [(&str, &str); 20] = [
    ("Number of gene", "Gene_Models (N)"),
    ("Number of mrna", "Transcript_Models (N)"),
    ("Number of cds", "CDS_Models (N)"),
    ("Number of exon", "Exons (N)"),
    ("Number of five_prime_utr", "UTR5' (N)"),
    ("Number of three_prime_utr", "UTR3' (N)"),
    ("Number gene overlapping", "Overlapping_Gene_Models (N)"),
    ("Number of single exon gene", "Single Exon Gene Models (N)"),
    ("Number of single exon mrna", "Single Exon Transcripts (N)"),
    ("Total gene length (bp)", "Total Gene Space (Mb)"),
    ("mean gene length (bp)", "Mean Gene Model Length (bp)"),
    ("mean cds length (bp)", "Mean CDS Model Length (bp)"),
    ("mean exon length (bp)", "Mean Exon Length (bp)"),
    ("mean intron in cds length (bp)", "Mean Intron Length (bp)"),
    ("Longest gene (bp)", "Longest Gene Model Length (bp)"),
    ("Longest cds (bp)", "Longest CDS Model Length (bp)"),
    ("Longest intron into cds part (bp)", "Longest Intron Length (bp)"),
    ("Shortest gene (bp)", "Shortest Gene Model Length (bp)"),
    ("Shortest cds piece (bp)", "Shortest CDS Model Length (bp)"),
    ("Shortest intron into cds part (bp)", "Shortest Intron Length (bp)"),
];

/// Split a stats line into its label and trailing integer. Tolerates both
/// `label   123` and `label: 1,234` shapes.
fn labeled_count(line: &str) -> Option<(&str, i64)> {
    let line = line.trim();
    let (label, value) = line.rsplit_once(char::is_whitespace)?;
    let value: i64 = value.replace(',', "").parse().ok()?;
    Some((label.trim_end_matches(':').trim_end(), value))
}

/// General annotation statistics.
pub fn parse_agat_stats(report: &StageReport) -> MetricsRow {
    let mut row = MetricsRow::new();
    let output = readable_output(report, "stats");

    match output {
        None => {
            for (_, metric) in STATS_MAPPING {
                row.insert(metric, MetricValue::failed());
            }
        }
        Some(path) => {
            let mut values: Vec<MetricValue> = STATS_MAPPING
                .iter()
                .map(|_| MetricValue::Count(0))
                .collect();
            scan_stats(&path, &mut values);
            for ((_, metric), value) in STATS_MAPPING.iter().zip(values) {
                row.insert(*metric, value);
            }
        }
    }
    row
}

fn scan_stats(path: &Path, values: &mut [MetricValue]) {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return,
    };
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        let Some((label, value)) = labeled_count(&line) else {
            continue;
        };
        let Some(position) = STATS_MAPPING.iter().position(|(key, _)| *key == label) else {
            continue;
        };
        values[position] = if STATS_MAPPING[position].1 == "Total Gene Space (Mb)" {
            MetricValue::Score(round2(value as f64 / 1_000_000.0))
        } else {
            MetricValue::Count(value)
        };
    }
}

/// Count of models flagged with a premature stop codon.
pub fn parse_agat_premature(report: &StageReport) -> MetricsRow {
    let mut row = MetricsRow::new();
    let Some(path) = readable_output(report, "premature") else {
        row.insert("Premature_Stop_Codons (N)", MetricValue::failed());
        return row;
    };

    let mut count = 0i64;
    if let Ok(file) = File::open(&path) {
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() > 8 && fields[2] == "mRNA" && fields[8].contains("premature_stop") {
                count += 1;
            }
        }
    }
    row.insert("Premature_Stop_Codons (N)", count);
    row
}

/// Start/stop completeness, derived from the `incomplete=` flags AGAT adds:
/// 1 = start missing, 2 = stop missing, 3 = both.
pub fn parse_agat_incomplete(report: &StageReport, transcripts: i64) -> MetricsRow {
    let mut row = MetricsRow::new();
    let keys = [
        "Models_without_Start (N)",
        "Models_without_Stop (N)",
        "Models_without_Start_and_Stop (N)",
        "Models_with_Start_and_Stop (%)",
    ];
    let Some(path) = readable_output(report, "incomplete") else {
        for key in keys {
            row.insert(key, MetricValue::failed());
        }
        return row;
    };

    let (mut start, mut stop, mut both) = (0i64, 0i64, 0i64);
    if let Ok(file) = File::open(&path) {
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 9 || fields[2] != "mRNA" {
                continue;
            }
            let attributes = fields[8];
            let flag = attributes
                .split(';')
                .find_map(|attribute| attribute.trim().strip_prefix("incomplete="));
            match flag {
                Some("1") => start += 1,
                Some("2") => stop += 1,
                Some("3") => both += 1,
                _ => {}
            }
        }
    }

    let complete = if transcripts > 0 {
        round2(100.0 - 100.0 * (start + stop + both) as f64 / transcripts as f64)
    } else {
        0.0
    };
    row.insert(keys[0], start);
    row.insert(keys[1], stop);
    row.insert(keys[2], both);
    row.insert(keys[3], complete);
    row
}

/// The transcript count other parsers use as their percentage denominator.
pub fn transcript_models(row: &MetricsRow) -> Option<i64> {
    match row.get("Transcript_Models (N)") {
        Some(MetricValue::Count(n)) => Some(*n),
        _ => None,
    }
}
