//! BUSCO completeness stage
//!
//! One sub-step per configured lineage, keyed by the lineage name. BUSCO
//! mishandles long absolute output paths, so each run gets its own lineage
//! directory as the child working directory.

use std::fs;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{run_step, RunOptions};

pub const STAGE_DIR: &str = "BUSCOCompleteness_run";

pub async fn run_busco(config: &PipelineConfig, protein_sequences: &Path) -> StageReport {
    let outdir = config.basedir.join(STAGE_DIR);
    let mut report = StageReport::new();

    for lineage in &config.busco_lineages {
        let lineage_outdir = outdir.join(lineage);
        if let Err(e) = fs::create_dir_all(&lineage_outdir) {
            report.push(
                lineage.clone(),
                StepResult {
                    command: String::new(),
                    status: StepStatus::Failed(format!("Failed: \n {}", e)),
                    output: None,
                },
            );
            continue;
        }

        let outfile = lineage_outdir
            .join(format!("run_{}", lineage))
            .join("short_summary.txt");
        let cmd = format!(
            "busco --cpu {} -i {} -o run_{} -m prot -l {} --force --tar",
            config.threads,
            protein_sequences.display(),
            lineage,
            lineage
        );
        report.push(
            lineage.clone(),
            run_step(&cmd, &outfile, &RunOptions::in_dir(&lineage_outdir)).await,
        );
    }

    report
}
