//! PSAURON coding-potential stage

use std::fs;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{run_step, RunOptions};

pub const STAGE_DIR: &str = "PSAURON_run";

pub async fn run_psauron(config: &PipelineConfig, cds_sequences: &Path) -> StageReport {
    let outdir = config.basedir.join(STAGE_DIR);
    let mut report = StageReport::new();
    if let Err(e) = fs::create_dir_all(&outdir) {
        report.push(
            "psauron",
            StepResult {
                command: String::new(),
                status: StepStatus::Failed(format!("Failed: \n {}", e)),
                output: None,
            },
        );
        return report;
    }

    let outfile = outdir.join(format!("{}.cds.psauron.csv", config.id));
    let cmd = format!(
        "psauron -i {} -o {}",
        cds_sequences.display(),
        outfile.display()
    );
    report.push("psauron", run_step(&cmd, &outfile, &RunOptions::default()).await);
    report
}
