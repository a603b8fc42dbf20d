//! Sequence extraction stage
//!
//! Runs gffread once per sequence kind (CDS, protein, mRNA, and the
//! longest-isoform variants) against the prepared annotation. The extra
//! `proteins_longest_busco` extraction skips `-J` and gets its duplicate
//! FASTA headers renamed, since BUSCO refuses inputs with repeated ids.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::engine::context::ExtractedSequences;
use crate::engine::result::{StageReport, StepResult, StepStatus};
use crate::engine::step::{internal_step, run_step, RunOptions};
use crate::stages::prepare::INPUT_DIR;

/// Extraction kinds in fixed order: (name, gffread mode flag).
const KINDS: [(&str, char); 7] = [
    ("cds", 'x'),
    ("proteins", 'y'),
    ("mrna", 'w'),
    ("cds_longest_isoform", 'x'),
    ("proteins_longest_isoform", 'y'),
    ("mrna_longest_isoform", 'w'),
    ("proteins_longest_busco", 'y'),
];

pub async fn run_gffread(
    config: &PipelineConfig,
    annotation: &Path,
    longest_annotation: &Path,
    assembly: &Path,
) -> StageReport {
    let outdir = config.basedir.join(INPUT_DIR);
    let mut report = StageReport::new();
    if let Err(e) = std::fs::create_dir_all(&outdir) {
        for (kind, _) in KINDS {
            report.push(
                kind,
                StepResult {
                    command: String::new(),
                    status: StepStatus::Failed(format!("Failed: \n {}", e)),
                    output: None,
                },
            );
        }
        return report;
    }

    let stem = config.assembly_stem();
    for (kind, mode) in KINDS {
        let outfile = outdir.join(format!("{}.{}.fasta", stem, kind));
        let source = if kind.contains("longest") {
            longest_annotation
        } else {
            annotation
        };
        // -J keeps only models with a full, valid ORF; the BUSCO set keeps
        // everything so completeness is judged on the raw annotation.
        let cmd = if kind.contains("busco") {
            format!(
                "gffread -{} {} -g {} {}",
                mode,
                outfile.display(),
                assembly.display(),
                source.display()
            )
        } else {
            format!(
                "gffread -{} {} -J -g {} {}",
                mode,
                outfile.display(),
                assembly.display(),
                source.display()
            )
        };

        let mut result = run_step(&cmd, &outfile, &RunOptions::default()).await;
        if kind.contains("busco") && !result.is_failed() {
            let renamed = outdir.join(format!("{}.{}.renamed.fasta", stem, kind));
            let rename = internal_step("Rename duplicated FASTA headers", &renamed, || {
                rename_duplicate_headers(&outfile, &renamed)
            });
            match rename.status {
                StepStatus::Failed(detail) => {
                    result.status = StepStatus::Failed(detail);
                }
                _ => {
                    result.output = Some(renamed);
                }
            }
        }
        report.push(kind, result);
    }
    report
}

/// Suffix every header with its occurrence counter (`id_1`, `id_2`, ...) so
/// repeated ids stay unique while input order is preserved.
pub fn rename_duplicate_headers(input: &Path, output: &Path) -> std::io::Result<()> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    let mut seen: HashMap<String, usize> = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(header) = line.strip_prefix('>') {
            let base_id = header.split_whitespace().next().unwrap_or("").to_string();
            let count = seen.entry(base_id.clone()).or_insert(0);
            *count += 1;
            writeln!(writer, ">{}_{}", base_id, count)?;
        } else {
            writeln!(writer, "{}", line)?;
        }
    }
    writer.flush()
}

/// Collect the artifact paths out of a successful extraction report.
pub fn extracted_sequences(report: &StageReport) -> Option<ExtractedSequences> {
    let path = |kind: &str| -> Option<PathBuf> {
        report.get(kind).and_then(|result| result.output.clone())
    };
    Some(ExtractedSequences {
        cds: path("cds")?,
        proteins: path("proteins")?,
        mrna: path("mrna")?,
        cds_longest: path("cds_longest_isoform")?,
        proteins_longest: path("proteins_longest_isoform")?,
        mrna_longest: path("mrna_longest_isoform")?,
        proteins_busco: path("proteins_longest_busco")?,
    })
}
