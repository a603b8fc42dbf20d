//! gffcompare stats parser
//!
//! F1 of sensitivity and precision at the transcript and locus level, plus
//! the matching transcript/loci counts.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::engine::result::{MetricValue, MetricsRow, StageReport};
use crate::parsers::{last_token, readable_output, round2};

pub fn rnaseq_stats(report: &StageReport) -> MetricsRow {
    let mut row = MetricsRow::new();
    let keys = [
        "RNASeq_Transcript_F1",
        "RNASeq_Locus_F1",
        "RNASeq_Matching_Transcripts (N)",
        "RNASeq_Matching_Loci (N)",
    ];
    let Some(path) = readable_output(report, "gffcompare") else {
        for key in keys {
            row.insert(key, MetricValue::failed());
        }
        return row;
    };

    let mut transcript_f1 = MetricValue::na();
    let mut locus_f1 = MetricValue::na();
    let mut matching_transcripts = MetricValue::na();
    let mut matching_loci = MetricValue::na();

    if let Ok(file) = File::open(&path) {
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            if line.contains("Transcript level:") {
                if let Some(f1) = f1_from_level_line(&line) {
                    transcript_f1 = MetricValue::Score(f1);
                }
            } else if line.contains("Locus level:") {
                if let Some(f1) = f1_from_level_line(&line) {
                    locus_f1 = MetricValue::Score(f1);
                }
            } else if line.contains("Matching transcripts:") {
                if let Some(token) = last_token(&line) {
                    matching_transcripts = MetricValue::Text(token.to_string());
                }
            } else if line.contains("Matching loci:") {
                if let Some(token) = last_token(&line) {
                    matching_loci = MetricValue::Text(token.to_string());
                }
            }
        }
    }

    row.insert(keys[0], transcript_f1);
    row.insert(keys[1], locus_f1);
    row.insert(keys[2], matching_transcripts);
    row.insert(keys[3], matching_loci);
    row
}

/// `    Transcript level:    45.2     |    60.1    |` → F1 of the two
/// percentages. Token positions follow the gffcompare layout: sensitivity
/// third, precision fifth.
fn f1_from_level_line(line: &str) -> Option<f64> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let sensitivity: f64 = fields.get(2)?.parse().ok()?;
    let precision: f64 = fields.get(4)?.parse().ok()?;
    if sensitivity + precision == 0.0 {
        return Some(0.0);
    }
    Some(round2(2.0 * sensitivity * precision / (sensitivity + precision)))
}
