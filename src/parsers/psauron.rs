//! PSAURON score parser

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::engine::result::{MetricValue, MetricsRow, StageReport};
use crate::parsers::{last_token, readable_output};

pub fn psauron_stats(report: &StageReport) -> MetricsRow {
    let mut row = MetricsRow::new();
    let Some(path) = readable_output(report, "psauron") else {
        row.insert("PSAURON SCORE", MetricValue::failed());
        return row;
    };

    let mut score = MetricValue::na();
    if let Ok(file) = File::open(&path) {
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            if line.contains("psauron score") {
                if let Some(token) = last_token(&line) {
                    score = MetricValue::Text(token.to_string());
                }
            }
        }
    }
    row.insert("PSAURON SCORE", score);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::{StepResult, StepStatus};
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn reads_the_trailing_score_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("psauron.csv");
        fs::write(
            &path,
            "# psauron v1.0\nmean psauron score of all CDS: 0.872\n",
        )
        .unwrap();
        let mut report = StageReport::new();
        report.push(
            "psauron",
            StepResult {
                command: "psauron".into(),
                status: StepStatus::Success("ok".into()),
                output: Some(path),
            },
        );
        let row = psauron_stats(&report);
        assert_eq!(row.get("PSAURON SCORE").unwrap().to_string(), "0.872");
    }

    #[test]
    fn absent_label_keeps_the_na_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("psauron.csv");
        fs::write(&path, "no score anywhere\n").unwrap();
        let mut report = StageReport::new();
        report.push(
            "psauron",
            StepResult {
                command: "psauron".into(),
                status: StepStatus::Success("ok".into()),
                output: Some(path),
            },
        );
        let row = psauron_stats(&report);
        assert_eq!(row.get("PSAURON SCORE").unwrap().to_string(), "NA");
    }

    #[test]
    fn failed_stage_yields_sentinel() {
        let mut report = StageReport::new();
        report.push(
            "psauron",
            StepResult {
                command: "psauron".into(),
                status: StepStatus::Failed("exit 2".into()),
                output: Some(PathBuf::from("/nonexistent")),
            },
        );
        let row = psauron_stats(&report);
        assert_eq!(row.get("PSAURON SCORE").unwrap().to_string(), "FAILED");
    }
}
