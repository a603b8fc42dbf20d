//! AGAT annotation-statistics stage
//!
//! Three sub-steps over the prepared annotation: the general statistics
//! report, flagging of models with premature stop codons, and flagging of
//! coding models missing their start/stop codon.

use std::fs;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{run_step, RunOptions};

pub const STAGE_DIR: &str = "AGAT_run";

pub async fn run_agat(config: &PipelineConfig, annotation: &Path, assembly: &Path) -> StageReport {
    let outdir = config.basedir.join(STAGE_DIR);
    let mut report = StageReport::new();
    if let Err(e) = fs::create_dir_all(&outdir) {
        report.push(
            "stats",
            StepResult {
                command: String::new(),
                status: StepStatus::Failed(format!("Failed: \n {}", e)),
                output: None,
            },
        );
        return report;
    }

    let stats_out = outdir.join(format!("{}.agat.stats.txt", config.id));
    let cmd = format!(
        "agat_sp_statistics.pl --gff {} -o {}",
        annotation.display(),
        stats_out.display()
    );
    report.push(
        "stats",
        run_step(&cmd, &stats_out, &RunOptions::stdout_diagnostics()).await,
    );

    let premature_out = outdir.join(format!("{}.premature_flagged.gff3", config.id));
    let cmd = format!(
        "agat_sp_flag_premature_stop_codons.pl --gff {} --fasta {} -o {}",
        annotation.display(),
        assembly.display(),
        premature_out.display()
    );
    report.push(
        "premature",
        run_step(&cmd, &premature_out, &RunOptions::stdout_diagnostics()).await,
    );

    // --add_flag keeps every model in one file and annotates the incomplete
    // ones with incomplete=1 (no start), 2 (no stop) or 3 (neither).
    let incomplete_out = outdir.join(format!("{}.incomplete_flagged.gff3", config.id));
    let cmd = format!(
        "agat_sp_filter_incomplete_gene_coding_models.pl --gff {} --fasta {} --add_flag -o {}",
        annotation.display(),
        assembly.display(),
        incomplete_out.display()
    );
    report.push(
        "incomplete",
        run_step(&cmd, &incomplete_out, &RunOptions::stdout_diagnostics()).await,
    );

    report
}
