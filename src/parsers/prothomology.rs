//! DIAMOND homology parser

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::engine::result::{MetricValue, MetricsRow, StageReport};
use crate::parsers::{readable_output, round2};

const MAX_EVALUE: f64 = 1e-20;

/// Percentage of transcripts with a strong hit per database tag, keyed
/// `ProteinsWith{tag}Hits (%)`. A query counts once however many alignments
/// it has.
pub fn protein_homology_stats(
    report: &StageReport,
    transcripts: i64,
    tags: &[String],
) -> MetricsRow {
    let mut row = MetricsRow::new();
    for tag in tags {
        let key = format!("ProteinsWith{}Hits (%)", tag);
        let Some(path) = readable_output(report, tag) else {
            row.insert(key, MetricValue::failed());
            continue;
        };

        let mut proteins: HashSet<String> = HashSet::new();
        if let Ok(file) = File::open(&path) {
            for line in BufReader::new(file).lines().map_while(Result::ok) {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < 11 {
                    continue;
                }
                let Ok(evalue) = fields[10].parse::<f64>() else {
                    continue;
                };
                if evalue < MAX_EVALUE {
                    proteins.insert(fields[0].to_string());
                }
            }
        }
        let percent = if transcripts > 0 {
            round2(proteins.len() as f64 / transcripts as f64 * 100.0)
        } else {
            0.0
        };
        row.insert(key, percent);
    }
    row
}
