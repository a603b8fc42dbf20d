use std::fs;
use std::path::Path;

use tempfile::TempDir;

use gaqet::{validate, PipelineConfig, RawConfig};

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// A minimal assembly + annotation pair with standard FASTA line lengths.
pub fn write_inputs(dir: &Path) -> RawConfig {
    let assembly = dir.join("genome.fasta");
    let annotation = dir.join("annot.gff3");
    fs::write(&assembly, ">chr1\nACGTACGTACGT\nACGTACGT\n").expect("write assembly");
    fs::write(
        &annotation,
        "##gff-version 3\n\
         chr1\ttest\tgene\t1\t120\t.\t+\t.\tID=g1\n\
         chr1\ttest\ttranscript\t1\t120\t.\t+\t.\tID=t1;Parent=g1\n\
         chr1\ttest\texon\t1\t120\t.\t+\t.\tParent=t1\n",
    )
    .expect("write annotation");
    RawConfig {
        id: Some("testrun".to_string()),
        assembly: Some(assembly),
        annotation: Some(annotation),
        omark_taxid: Some("4081".to_string()),
        ..RawConfig::default()
    }
}

pub fn validated(raw: &RawConfig, basedir: &Path) -> PipelineConfig {
    let report = validate(raw, basedir.to_path_buf());
    report
        .config
        .unwrap_or_else(|| panic!("config should validate:\n{}", report.text))
}

/// Seed every artifact the mandatory pre-stages expect, so a run without
/// any external tool installed sees each step as already done.
pub fn seed_pre_stage_artifacts(basedir: &Path, stem: &str) {
    let input = basedir.join("input_sequences");
    fs::create_dir_all(&input).expect("create input_sequences");
    fs::write(
        input.join("reformatted_annotation.gff3"),
        "chr1\ttest\tmRNA\t1\t120\t.\t+\t.\tID=t1\n",
    )
    .expect("seed reformatted annotation");
    fs::write(
        input.join("longest_isoform_annotation.gff3"),
        "chr1\ttest\tmRNA\t1\t120\t.\t+\t.\tID=t1\n",
    )
    .expect("seed longest isoform");

    let kinds = [
        "cds",
        "proteins",
        "mrna",
        "cds_longest_isoform",
        "proteins_longest_isoform",
        "mrna_longest_isoform",
        "proteins_longest_busco",
    ];
    for kind in kinds {
        fs::write(
            input.join(format!("{}.{}.fasta", stem, kind)),
            ">t1\nMKTAYIAK\n>t2\nMLLSDA\n>t3\nMGGR\n",
        )
        .expect("seed extracted fasta");
    }
    fs::write(
        input.join(format!("{}.proteins_longest_busco.renamed.fasta", stem)),
        ">t1_1\nMKTAYIAK\n>t2_1\nMLLSDA\n>t3_1\nMGGR\n",
    )
    .expect("seed renamed busco fasta");
}

/// Seed an AGAT stage output set with fixed, easily checked numbers.
pub fn seed_agat_artifacts(basedir: &Path, id: &str) {
    let outdir = basedir.join("AGAT_run");
    fs::create_dir_all(&outdir).expect("create AGAT_run");
    fs::write(
        outdir.join(format!("{}.agat.stats.txt", id)),
        "Number of gene: 100\n\
         Number of mrna: 120\n\
         Total gene length (bp): 2,000,000\n",
    )
    .expect("seed agat stats");
    fs::write(
        outdir.join(format!("{}.premature_flagged.gff3", id)),
        "chr1\tagat\tmRNA\t1\t10\t.\t+\t.\tID=t1;premature_stop=1\n",
    )
    .expect("seed premature");
    fs::write(
        outdir.join(format!("{}.incomplete_flagged.gff3", id)),
        "chr1\tagat\tmRNA\t1\t10\t.\t+\t.\tID=t1;incomplete=1\n\
         chr1\tagat\tmRNA\t1\t10\t.\t+\t.\tID=t2;incomplete=2\n\
         chr1\tagat\tmRNA\t1\t10\t.\t+\t.\tID=t3;incomplete=3\n",
    )
    .expect("seed incomplete");
}

pub fn seed_psauron_artifact(basedir: &Path, id: &str) {
    let outdir = basedir.join("PSAURON_run");
    fs::create_dir_all(&outdir).expect("create PSAURON_run");
    fs::write(
        outdir.join(format!("{}.cds.psauron.csv", id)),
        "mean psauron score of all CDS: 0.931\n",
    )
    .expect("seed psauron");
}

pub fn seed_busco_artifact(basedir: &Path, lineage: &str) {
    let outdir = basedir
        .join("BUSCOCompleteness_run")
        .join(lineage)
        .join(format!("run_{}", lineage));
    fs::create_dir_all(&outdir).expect("create BUSCO run dir");
    fs::write(
        outdir.join("short_summary.txt"),
        "# BUSCO results\n\tC:97.5%[S:95.0%,D:2.5%],F:1.0%,M:1.5%,n:2326\n",
    )
    .expect("seed busco summary");
}

/// Seed the DeTEnGA tool outputs but not the summary, so the in-process
/// evidence merge still runs. Returns the path of the TE-Pfam table to put
/// in the config.
pub fn seed_detenga_artifacts(dir: &Path, basedir: &Path, stem: &str) -> std::path::PathBuf {
    let outdir = basedir.join("DETENGA_run");
    fs::create_dir_all(&outdir).expect("create DETENGA_run");

    let pfams = dir.join("rexdb_pfams.txt");
    fs::write(&pfams, "#accession\tname\nPF07727\tRVT_2 reverse transcriptase\n")
        .expect("write pfam table");

    fs::write(
        outdir.join(format!("{}.mrna.filtered.fasta", stem)),
        ">t1\nACGT\n>t2\nACGT\n",
    )
    .expect("seed filtered mrna");
    fs::write(
        outdir.join(format!("{}.mrna.filtered.fasta.rexdb-plant.cls.tsv", stem)),
        "#TE\tOrder\tSuperfamily\tClade\tComplete\tStrand\tDomains\n\
         t1\tLTR\tCopia\tAle\tyes\t+\tRT\n",
    )
    .expect("seed tesorter table");
    fs::write(
        outdir.join(format!("{}.pep.nostop.fasta", stem)),
        ">t1\nMKT\n>t2\nMLL\n",
    )
    .expect("seed nostop fasta");
    fs::write(
        outdir.join(format!("{}.pep.nostop.fasta.tsv", stem)),
        "t1\tmd5\t300\tPfam\tPF00069\tKinase\t10\t200\t1e-30\tT\n\
         t2\tmd5\t200\tPfam\tPF07727\tRVT_2\t5\t150\t1e-25\tT\n",
    )
    .expect("seed interpro table");
    pfams
}

/// Read the two-line TSV report back as (header, row) field vectors.
pub fn read_report(path: &Path) -> (Vec<String>, Vec<String>) {
    let text = fs::read_to_string(path).expect("read report");
    let mut lines = text.lines();
    let header = lines
        .next()
        .expect("header line")
        .split('\t')
        .map(String::from)
        .collect();
    let row = lines
        .next()
        .expect("data line")
        .split('\t')
        .map(String::from)
        .collect();
    (header, row)
}
