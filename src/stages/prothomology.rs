//! Protein homology stage
//!
//! One DIAMOND blastp search per configured tag → database pair, keyed by
//! the tag name.

use std::fs;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{run_step, RunOptions};

pub const STAGE_DIR: &str = "DIAMOND_run";

pub async fn run_protein_homology(
    config: &PipelineConfig,
    protein_sequences: &Path,
) -> StageReport {
    let outdir = config.basedir.join(STAGE_DIR);
    let mut report = StageReport::new();
    if let Err(e) = fs::create_dir_all(&outdir) {
        for db in &config.prothomology_tags {
            report.push(
                db.tag.clone(),
                StepResult {
                    command: String::new(),
                    status: StepStatus::Failed(format!("Failed: \n {}", e)),
                    output: None,
                },
            );
        }
        return report;
    }

    for db in &config.prothomology_tags {
        let outfile = outdir.join(format!("{}.proteins.dmd.{}.o6.txt", config.id, db.tag));
        let cmd = format!(
            "diamond blastp --threads {} --db {} --query {} --out {}",
            config.threads,
            db.path.display(),
            protein_sequences.display(),
            outfile.display()
        );
        report.push(
            db.tag.clone(),
            run_step(&cmd, &outfile, &RunOptions::default()).await,
        );
    }
    report
}
