//! OMArk orthology stage
//!
//! Two sub-steps: an `omamer search` placing every protein into HOGs, then
//! `omark` scoring the placement against the expected taxon.

use std::fs;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{run_step, RunOptions};

pub const STAGE_DIR: &str = "OMARK";

pub async fn run_omark(config: &PipelineConfig, protein_sequences: &Path) -> StageReport {
    let outdir = config.basedir.join(STAGE_DIR);
    let mut report = StageReport::new();

    let failed = |detail: String| StepResult {
        command: String::new(),
        status: StepStatus::Failed(detail),
        output: None,
    };

    let (db, taxid) = match (&config.omark_db, &config.omark_taxid) {
        (Some(db), Some(taxid)) => (db, taxid),
        _ => {
            report.push("omamer", failed("Failed: OMARK_db/OMARK_taxid not configured".into()));
            return report;
        }
    };
    if let Err(e) = fs::create_dir_all(&outdir) {
        report.push("omamer", failed(format!("Failed: \n {}", e)));
        return report;
    }

    let omamer_outfile = outdir.join(format!("{}_proteins.omamer", config.id));
    let cmd = format!(
        "omamer search --db {} --query {} --out {}",
        db.display(),
        protein_sequences.display(),
        omamer_outfile.display()
    );
    let omamer = run_step(&cmd, &omamer_outfile, &RunOptions::default()).await;
    let omamer_failed = omamer.is_failed();
    report.push("omamer", omamer);

    let omark_dir = outdir.join(format!("{}_proteins.omark", config.id));
    let omark_outfile = omark_dir.join(format!("{}_proteins_detailed_summary.txt", config.id));
    let cmd = format!(
        "omark -f {} -d {} -t {} -o {}",
        omamer_outfile.display(),
        db.display(),
        taxid,
        omark_dir.display()
    );
    if omamer_failed {
        // No placement file to score; don't let omark produce a confusing
        // secondary error.
        report.push(
            "omark",
            StepResult {
                command: cmd,
                status: StepStatus::Failed("Failed: omamer search did not produce a placement file".into()),
                output: Some(omark_outfile),
            },
        );
    } else {
        report.push(
            "omark",
            run_step(&cmd, &omark_outfile, &RunOptions::default()).await,
        );
    }

    report
}
