//! OMArk detailed-summary parser
//!
//! Folds the consistency, completeness and species-composition sections of
//! the detailed summary into three composite report fields. Every
//! accumulator starts at "NA" so a truncated summary still produces a row.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::engine::result::{MetricValue, MetricsRow, StageReport};
use crate::parsers::{last_token, readable_output};

#[derive(Debug)]
struct Accumulators {
    clade: String,
    hogs: String,
    single: String,
    duplicated: String,
    duplicated_unexpected: String,
    duplicated_expected: String,
    missing: String,
    consistent: String,
    consistent_partial: String,
    consistent_fragmented: String,
    inconsistent: String,
    inconsistent_partial: String,
    inconsistent_fragmented: String,
    contaminants: String,
    unknown: String,
    compositions: Vec<String>,
}

impl Default for Accumulators {
    fn default() -> Self {
        let na = || "NA".to_string();
        Self {
            clade: na(),
            hogs: na(),
            single: na(),
            duplicated: na(),
            duplicated_unexpected: na(),
            duplicated_expected: na(),
            missing: na(),
            consistent: na(),
            consistent_partial: na(),
            consistent_fragmented: na(),
            inconsistent: na(),
            inconsistent_partial: na(),
            inconsistent_fragmented: na(),
            contaminants: na(),
            unknown: na(),
            compositions: Vec::new(),
        }
    }
}

pub fn omark_stats(report: &StageReport) -> MetricsRow {
    let mut row = MetricsRow::new();
    let keys = [
        "OMArk Consistency Results",
        "OMArk Completeness Results",
        "OMArk Species Composition",
    ];
    let Some(path) = readable_output(report, "omark") else {
        for key in keys {
            row.insert(key, MetricValue::failed());
        }
        return row;
    };

    let mut acc = Accumulators::default();
    // Species-composition blocks repeat "Clade:" then the share of query
    // proteins assigned to it.
    let mut composition_clade = "NA".to_string();
    if let Ok(file) = File::open(&path) {
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            let take = |target: &mut String| {
                if let Some(token) = last_token(&line) {
                    *target = token.to_string();
                }
            };
            if line.contains("The clade used was") {
                take(&mut acc.clade);
            } else if line.contains("Number of conserved HOGs") {
                take(&mut acc.hogs);
            } else if line.contains("Single:") {
                take(&mut acc.single);
            } else if line.contains("Duplicated, Unexpected:") {
                take(&mut acc.duplicated_unexpected);
            } else if line.contains("Duplicated, Expected:") {
                take(&mut acc.duplicated_expected);
            } else if line.contains("Duplicated:") {
                take(&mut acc.duplicated);
            } else if line.contains("Missing:") {
                take(&mut acc.missing);
            } else if line.contains("Total Consistent") {
                take(&mut acc.consistent);
            } else if line.contains("Consistent, partial hits") {
                take(&mut acc.consistent_partial);
            } else if line.contains("Consistent, fragmented") {
                take(&mut acc.consistent_fragmented);
            } else if line.contains("Total Inconsistent") {
                take(&mut acc.inconsistent);
            } else if line.contains("Inconsistent, partial hits") {
                take(&mut acc.inconsistent_partial);
            } else if line.contains("Inconsistent, fragmented") {
                take(&mut acc.inconsistent_fragmented);
            } else if line.contains("Total Contaminants") {
                take(&mut acc.contaminants);
            } else if line.contains("Total Unknown") {
                take(&mut acc.unknown);
            } else if line.contains("Clade") {
                if let Some((_, value)) = line.rsplit_once(':') {
                    composition_clade = value.trim().to_string();
                }
            } else if line.contains("associated query proteins") {
                if let Some(token) = last_token(&line) {
                    acc.compositions
                        .push(format!("{}: {}", composition_clade, token));
                }
            }
        }
    }

    let consistency = format!(
        "Cons:{}[P:{};F:{}],Inco:{}[P:{},F:{}],Cont:{},Unkn:{}",
        acc.consistent,
        acc.consistent_partial,
        acc.consistent_fragmented,
        acc.inconsistent,
        acc.inconsistent_partial,
        acc.inconsistent_fragmented,
        acc.contaminants,
        acc.unknown
    );
    let completeness = format!(
        "{}: {}; S:{},D:{}[U:{},E:{}],M:{}",
        acc.clade,
        acc.hogs,
        acc.single,
        acc.duplicated,
        acc.duplicated_unexpected,
        acc.duplicated_expected,
        acc.missing
    );
    let composition = if acc.compositions.is_empty() {
        "NA".to_string()
    } else {
        acc.compositions.join("; ")
    };

    row.insert(keys[0], consistency);
    row.insert(keys[1], completeness);
    row.insert(keys[2], composition);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::{StepResult, StepStatus};
    use std::fs;
    use std::path::PathBuf;

    const SUMMARY: &str = "\
#The clade used was: Solanum\n\
#Number of conserved HOGs is: 18582\n\
#Results on conserved HOGs is:\n\
#Single: 88.82%\n\
#Duplicated: 5.25%\n\
#Duplicated, Unexpected: 3.21%\n\
#Duplicated, Expected: 2.04%\n\
#Missing: 5.93%\n\
#On the whole proteome, there is:\n\
#Total Consistent: 93.70%\n\
#Consistent, partial hits: 2.87%\n\
#Consistent, fragmented: 1.45%\n\
#Total Inconsistent: 4.44%\n\
#Inconsistent, partial hits: 1.24%\n\
#Inconsistent, fragmented: 0.87%\n\
#Total Contaminants: 0.00%\n\
#Total Unknown: 1.86%\n\
#From the HOG placement, the detected species are:\n\
#Clade: Solanum lycopersicum\n\
#Percentage of associated query proteins: 98.14%\n";

    fn report_with_summary(body: &str) -> (tempfile::TempDir, StageReport) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detailed_summary.txt");
        fs::write(&path, body).unwrap();
        let mut report = StageReport::new();
        report.push(
            "omamer",
            StepResult {
                command: "omamer".into(),
                status: StepStatus::Success("ok".into()),
                output: None,
            },
        );
        report.push(
            "omark",
            StepResult {
                command: "omark".into(),
                status: StepStatus::Success("ok".into()),
                output: Some(path),
            },
        );
        (dir, report)
    }

    #[test]
    fn composite_fields_are_assembled() {
        let (_dir, report) = report_with_summary(SUMMARY);
        let row = omark_stats(&report);
        assert_eq!(
            row.get("OMArk Consistency Results").unwrap().to_string(),
            "Cons:93.70%[P:2.87%;F:1.45%],Inco:4.44%[P:1.24%,F:0.87%],Cont:0.00%,Unkn:1.86%"
        );
        assert_eq!(
            row.get("OMArk Completeness Results").unwrap().to_string(),
            "Solanum: 18582; S:88.82%,D:5.25%[U:3.21%,E:2.04%],M:5.93%"
        );
        assert_eq!(
            row.get("OMArk Species Composition").unwrap().to_string(),
            "Solanum lycopersicum: 98.14%"
        );
    }

    #[test]
    fn empty_summary_keeps_na_defaults() {
        let (_dir, report) = report_with_summary("#nothing informative\n");
        let row = omark_stats(&report);
        let consistency = row.get("OMArk Consistency Results").unwrap().to_string();
        assert!(consistency.contains("Cons:NA"));
        assert!(consistency.contains("Unkn:NA"));
        assert_eq!(
            row.get("OMArk Species Composition").unwrap().to_string(),
            "NA"
        );
    }

    #[test]
    fn failed_stage_yields_sentinels() {
        let mut report = StageReport::new();
        report.push(
            "omark",
            StepResult {
                command: "omark".into(),
                status: StepStatus::Failed("exit 1".into()),
                output: Some(PathBuf::from("/nonexistent")),
            },
        );
        let row = omark_stats(&report);
        for key in [
            "OMArk Consistency Results",
            "OMArk Completeness Results",
            "OMArk Species Composition",
        ] {
            assert_eq!(row.get(key).unwrap().to_string(), "FAILED");
        }
    }
}
