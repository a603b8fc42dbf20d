//! LTR Assembly Index stage
//!
//! Chains the genometools/LTR_retriever family over the assembly. The LTR
//! tools insist on resolving inputs relative to their working directory, so
//! every command after the indexing runs with the stage directory as the
//! child cwd and refers to the assembly by file name.

use std::fs;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{run_step, RunOptions};

pub const STAGE_DIR: &str = "LAICompleteness";

pub async fn run_lai(config: &PipelineConfig, assembly: &Path) -> StageReport {
    let outdir = config.basedir.join(STAGE_DIR);
    let mut report = StageReport::new();
    if let Err(e) = fs::create_dir_all(&outdir) {
        report.push(
            "link",
            StepResult {
                command: String::new(),
                status: StepStatus::Failed(format!("Failed: \n {}", e)),
                output: None,
            },
        );
        return report;
    }

    let name = assembly
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "assembly.fasta".to_string());
    let linked = outdir.join(&name);

    // The tools write many sibling files next to their input; a symlink
    // keeps all of that inside the stage directory.
    let cmd = format!("ln -s {} {}", assembly.display(), linked.display());
    report.push("link", run_step(&cmd, &linked, &RunOptions::default()).await);

    let cmd = format!(
        "gt suffixerator -db {} -indexname {} -tis -suf -lcp -des -ssp -sds -dna",
        linked.display(),
        linked.display()
    );
    let index_marker = outdir.join(format!("{}.suf", name));
    report.push(
        "suffixerator",
        run_step(&cmd, &index_marker, &RunOptions::default()).await,
    );

    let harvest_out = outdir.join(format!("{}.harvest.scn", name));
    let cmd = format!(
        "gt ltrharvest -index {} -minlenltr 100 -maxlenltr 7000 -mintsd 4 -maxtsd 6 \
         -motif TGCA -motifmis 1 -similar 85 -vic 10 -seed 20 -seqids yes > {}",
        linked.display(),
        harvest_out.display()
    );
    report.push(
        "harvest",
        run_step(&cmd, &harvest_out, &RunOptions::default()).await,
    );

    let finder_out = outdir.join(format!("{}.finder.combine.scn", name));
    let cmd = format!(
        "LTR_FINDER_parallel -seq {} -threads {} -harvest_out -size 1000000 -time 300",
        name, config.threads
    );
    report.push(
        "finder",
        run_step(&cmd, &finder_out, &RunOptions::in_dir(&outdir)).await,
    );

    let raw_out = outdir.join(format!("{}.rawLTR.scn", name));
    let cmd = format!(
        "cat {}.harvest.scn {}.finder.combine.scn > {}.rawLTR.scn",
        name, name, name
    );
    report.push(
        "concatenate",
        run_step(&cmd, &raw_out, &RunOptions::in_dir(&outdir)).await,
    );

    let pass_list = outdir.join(format!("{}.mod.pass.list", name));
    let cmd = format!(
        "LTR_retriever -genome {} -inharvest {}.rawLTR.scn -threads {}",
        name, name, config.threads
    );
    report.push(
        "ltr_retriever",
        run_step(&cmd, &pass_list, &RunOptions::in_dir(&outdir)).await,
    );

    let lai_out = outdir.join(format!("{}.mod.out.LAI", name));
    let cmd = format!(
        "LAI -genome {} -intact {}.mod.pass.list -all {}.mod.out",
        name, name, name
    );
    report.push(
        "lai",
        run_step(&cmd, &lai_out, &RunOptions::in_dir(&outdir)).await,
    );

    report
}
