//! RNA-seq agreement stage
//!
//! Assembles transcripts from read alignments with StringTie and compares
//! them to the annotation with gffcompare.

use std::fs;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{run_step, RunOptions};

pub const STAGE_DIR: &str = "RNASeqCheck";

pub async fn run_rnaseq(config: &PipelineConfig, annotation: &Path) -> StageReport {
    let outdir = config.basedir.join(STAGE_DIR);
    let mut report = StageReport::new();

    let failed = |detail: String| StepResult {
        command: String::new(),
        status: StepStatus::Failed(detail),
        output: None,
    };

    let alignments = match &config.rnaseq_alignments {
        Some(path) => path,
        None => {
            report.push(
                "stringtie",
                failed("Failed: RNASEQ_alignments not configured".to_string()),
            );
            return report;
        }
    };
    if let Err(e) = fs::create_dir_all(&outdir) {
        report.push("stringtie", failed(format!("Failed: \n {}", e)));
        return report;
    }

    let stem = alignments
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "alignments".to_string());

    let gtf = outdir.join(format!("{}.gtf", stem));
    let cmd = format!(
        "stringtie -o {} -p {} {}",
        gtf.display(),
        config.threads,
        alignments.display()
    );
    let stringtie = run_step(&cmd, &gtf, &RunOptions::default()).await;
    let stringtie_failed = stringtie.is_failed();
    report.push("stringtie", stringtie);

    let prefix = outdir.join(&stem);
    let stats = outdir.join(format!("{}.stats", stem));
    let cmd = format!(
        "gffcompare -r {} {} -o {}",
        annotation.display(),
        gtf.display(),
        prefix.display()
    );
    let gffcompare = if stringtie_failed {
        StepResult {
            command: cmd,
            status: StepStatus::Failed("Failed: stringtie produced no transcripts".to_string()),
            output: Some(stats),
        }
    } else {
        run_step(&cmd, &stats, &RunOptions::default()).await
    };
    report.push("gffcompare", gffcompare);

    report
}
