//! Mandatory input-preparation steps
//!
//! These run before any requested analysis and seed the run context: the
//! annotation is normalized so every transcript record is an `mRNA`, the
//! assembly is reformatted when its sequence lines are non-standard, and the
//! longest isoform per gene is extracted for the stages that want one model
//! per locus.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::engine::result::StepResult;
use crate::engine::step::{internal_step, run_step, RunOptions};

pub const INPUT_DIR: &str = "input_sequences";

fn input_dir(config: &PipelineConfig) -> std::io::Result<PathBuf> {
    let dir = config.basedir.join(INPUT_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Rewrite `transcript` feature records to `mRNA` so downstream tools see a
/// single transcript type. Comment lines pass through untouched.
pub fn split_annotation(config: &PipelineConfig) -> StepResult {
    let outfile = match input_dir(config) {
        Ok(dir) => dir.join("reformatted_annotation.gff3"),
        Err(e) => {
            return internal_step(
                "Separate annotation by feature type",
                &config.basedir.join(INPUT_DIR).join("reformatted_annotation.gff3"),
                move || Err(e),
            )
        }
    };
    let annotation = config.annotation.clone();
    internal_step("Separate annotation by feature type", &outfile, || {
        let reader = BufReader::new(File::open(&annotation)?);
        let mut writer = BufWriter::new(File::create(&outfile)?);
        for line in reader.lines() {
            let line = line?;
            if line.starts_with('#') {
                writeln!(writer, "{}", line)?;
                continue;
            }
            let mut fields: Vec<&str> = line.split('\t').collect();
            if fields.len() > 2 && fields[2] == "transcript" {
                fields[2] = "mRNA";
                writeln!(writer, "{}", fields.join("\t"))?;
            } else {
                writeln!(writer, "{}", line)?;
            }
        }
        writer.flush()
    })
}

/// True when the first sequence line is at most 80 bases. One-line-per-record
/// FASTA files upset several of the wrapped tools.
pub fn has_standard_line_length(assembly: &Path) -> std::io::Result<bool> {
    let reader = BufReader::new(File::open(assembly)?);
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('>') {
            continue;
        }
        return Ok(line.trim_end().len() <= 80);
    }
    Ok(true)
}

/// Rewrap the assembly to 80-column sequence lines with seqtk.
pub async fn reformat_assembly(config: &PipelineConfig) -> StepResult {
    let outfile = config
        .basedir
        .join(INPUT_DIR)
        .join(format!("{}.reformatted.fasta", config.assembly_stem()));
    if let Err(e) = input_dir(config) {
        return internal_step("Reformat assembly file", &outfile, move || Err(e));
    }
    let cmd = format!(
        "seqtk seq -l 80 {} > {}",
        config.assembly.display(),
        outfile.display()
    );
    run_step(&cmd, &outfile, &RunOptions::default()).await
}

/// Keep the single longest isoform per gene locus.
pub async fn longest_isoform(config: &PipelineConfig, annotation: &Path) -> StepResult {
    let outfile = config
        .basedir
        .join(INPUT_DIR)
        .join("longest_isoform_annotation.gff3");
    if let Err(e) = input_dir(config) {
        return internal_step("Keep longest isoform", &outfile, move || Err(e));
    }
    let cmd = format!(
        "agat_sp_keep_longest_isoform.pl --gff {} -o {}",
        annotation.display(),
        outfile.display()
    );
    // AGAT scripts report their errors on stdout.
    run_step(&cmd, &outfile, &RunOptions::stdout_diagnostics()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{raw::RawConfig, validate::validate};
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, annotation_body: &str, assembly_body: &str) -> PipelineConfig {
        let assembly = dir.path().join("genome.fasta");
        let annotation = dir.path().join("annot.gff3");
        fs::write(&assembly, assembly_body).unwrap();
        fs::write(&annotation, annotation_body).unwrap();
        let raw = RawConfig {
            id: Some("test".to_string()),
            assembly: Some(assembly),
            annotation: Some(annotation),
            analysis: vec!["AGAT".to_string()],
            ..RawConfig::default()
        };
        validate(&raw, dir.path().join("out")).config.unwrap()
    }

    #[test]
    fn split_annotation_rewrites_transcript_records() {
        let dir = tempfile::tempdir().unwrap();
        let gff = "##gff-version 3\n\
                   chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n\
                   chr1\tsrc\ttranscript\t1\t100\t.\t+\t.\tID=t1;Parent=g1\n\
                   chr1\tsrc\texon\t1\t100\t.\t+\t.\tParent=t1\n";
        let config = test_config(&dir, gff, ">chr1\nACGT\n");

        let result = split_annotation(&config);
        assert!(!result.is_failed(), "{:?}", result.status);

        let out = fs::read_to_string(result.output.unwrap()).unwrap();
        assert!(out.contains("\tmRNA\t"));
        assert!(!out.contains("\ttranscript\t"));
        assert!(out.contains("##gff-version 3"));
        // Gene and exon records untouched.
        assert!(out.contains("\tgene\t"));
        assert!(out.contains("\texon\t"));
    }

    #[test]
    fn split_annotation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(
            &dir,
            "chr1\tsrc\ttranscript\t1\t9\t.\t+\t.\tID=t1\n",
            ">chr1\nACGT\n",
        );
        let first = split_annotation(&config);
        let second = split_annotation(&config);
        assert!(!first.is_failed());
        assert!(second.status.is_already_done());
        assert_eq!(first.output, second.output);
    }

    #[test]
    fn line_length_check_flags_oversized_lines() {
        let dir = tempfile::tempdir().unwrap();
        let long_line = "A".repeat(200);
        let config = test_config(&dir, "", &format!(">chr1\n{}\n", long_line));
        assert!(!has_standard_line_length(&config.assembly).unwrap());

        let wrapped = dir.path().join("wrapped.fasta");
        fs::write(&wrapped, format!(">chr1\n{}\n", "A".repeat(80))).unwrap();
        assert!(has_standard_line_length(&wrapped).unwrap());
    }
}
