//! BUSCO summary parser

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::engine::result::{MetricValue, MetricsRow, StageReport};
use crate::parsers::readable_output;

/// One metric per configured lineage, keyed `Annotation_BUSCO_{lineage}`.
/// The lineage name is an opaque token; it is never re-split or reparsed.
/// The value is the one-line completeness string from `short_summary.txt`
/// (`C:98.2%[S:96.1%,D:2.1%],F:0.8%,M:1.0%,n:2326`).
pub fn busco_stats(report: &StageReport, lineages: &[String]) -> MetricsRow {
    let mut row = MetricsRow::new();
    for lineage in lineages {
        let key = format!("Annotation_BUSCO_{}", lineage);
        let step_failed = report
            .get(lineage)
            .map(|step| step.is_failed())
            .unwrap_or(true);
        if step_failed {
            row.insert(key, MetricValue::failed());
            continue;
        }
        let mut value = MetricValue::na();
        if let Some(path) = readable_output(report, lineage) {
            if let Ok(file) = File::open(&path) {
                for line in BufReader::new(file).lines().map_while(Result::ok) {
                    if line.contains('%') {
                        value = MetricValue::Text(line.trim().to_string());
                    }
                }
            }
        } else {
            value = MetricValue::failed();
        }
        row.insert(key, value);
    }
    row
}
