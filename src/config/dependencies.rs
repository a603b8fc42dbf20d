//! External binary pre-flight checks

use which::which;

use crate::config::validate::PipelineConfig;
use crate::engine::log::{BULLET_FIX, BULLET_OK, HEADER_RULE};

/// Binaries every run needs, regardless of the analysis list.
const ALWAYS: [&str; 3] = ["gffread", "seqtk", "agat_sp_keep_longest_isoform.pl"];

pub struct DependencyReport {
    pub text: String,
    pub ok: bool,
}

/// Resolve every required binary on PATH before any stage runs.
pub fn check_dependencies(config: &PipelineConfig) -> DependencyReport {
    let mut report = Vec::new();
    let mut ok = true;

    let mut check = |report: &mut Vec<String>, binary: &str| {
        if which(binary).is_ok() {
            report.push(format!("{}Binary {} found", BULLET_OK, binary));
        } else {
            report.push(format!("{}Binary {} not found", BULLET_FIX, binary));
            ok = false;
        }
    };

    report.push(format!(
        "{}Checking binaries for sequence extraction{}",
        HEADER_RULE, HEADER_RULE
    ));
    for binary in ALWAYS {
        check(&mut report, binary);
    }

    for analysis in config.ordered_analyses() {
        report.push(format!(
            "{}Checking binaries for {}{}",
            HEADER_RULE, analysis, HEADER_RULE
        ));
        for binary in analysis.binaries() {
            check(&mut report, binary);
        }
    }

    DependencyReport {
        text: report.join("\n"),
        ok,
    }
}
