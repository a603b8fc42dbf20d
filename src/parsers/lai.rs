//! LTR Assembly Index parser

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::engine::result::{MetricValue, MetricsRow, StageReport};
use crate::parsers::{last_token, readable_output};

/// Whole-genome LAI value from the `.mod.out.LAI` table.
pub fn lai_stats(report: &StageReport) -> MetricsRow {
    let mut row = MetricsRow::new();
    let Some(path) = readable_output(report, "lai") else {
        row.insert("LAI Score", MetricValue::failed());
        return row;
    };

    let mut score = MetricValue::na();
    if let Ok(file) = File::open(&path) {
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            if line.starts_with("whole_genome") {
                if let Some(token) = last_token(&line) {
                    score = match token.parse::<f64>() {
                        Ok(value) => MetricValue::Score(value),
                        Err(_) => MetricValue::Text(token.to_string()),
                    };
                }
            }
        }
    }
    row.insert("LAI Score", score);
    row
}
