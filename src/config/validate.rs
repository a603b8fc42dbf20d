//! Configuration validation
//!
//! Turns a [`RawConfig`] into a typed [`PipelineConfig`], aggregating every
//! problem into one human-readable report. Nothing under Basedir is touched
//! until the report is clean.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::analysis::{Analysis, CANONICAL_ORDER};
use crate::config::raw::RawConfig;
use crate::engine::log::{BULLET_FIX, BULLET_OK, HEADER_RULE};

/// Validated, immutable run configuration. Stages receive it by reference
/// and never mutate it; derived artifacts go through the run context.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub id: String,
    pub assembly: PathBuf,
    pub annotation: PathBuf,
    pub basedir: PathBuf,
    pub analyses: Vec<Analysis>,
    pub threads: usize,
    pub busco_lineages: Vec<String>,
    pub omark_db: Option<PathBuf>,
    pub omark_taxid: Option<String>,
    pub detenga_db: Option<String>,
    pub detenga_pfams: Option<PathBuf>,
    pub prothomology_tags: Vec<ProteinDatabase>,
    pub rnaseq_alignments: Option<PathBuf>,
    pub disable_busco_filter: bool,
}

/// One tag → DIAMOND database pair from `PROTHOMOLOGY_tags`.
#[derive(Debug, Clone)]
pub struct ProteinDatabase {
    pub tag: String,
    pub path: PathBuf,
}

impl PipelineConfig {
    pub fn requested(&self, analysis: Analysis) -> bool {
        self.analyses.contains(&analysis)
    }

    /// Requested stages in canonical execution order, whatever order the
    /// config listed them in.
    pub fn ordered_analyses(&self) -> Vec<Analysis> {
        CANONICAL_ORDER
            .into_iter()
            .filter(|analysis| self.requested(*analysis))
            .collect()
    }

    /// File-name stem of the assembly, used to derive artifact names.
    pub fn assembly_stem(&self) -> String {
        self.assembly
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "assembly".to_string())
    }
}

/// Outcome of validating a [`RawConfig`].
pub struct ConfigReport {
    pub text: String,
    pub config: Option<PipelineConfig>,
}

impl ConfigReport {
    pub fn is_ok(&self) -> bool {
        self.config.is_some()
    }
}

const DETENGA_DBS: [&str; 3] = ["rexdb-plant", "rexdb-metazoa", "rexdb"];

fn lineage_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Lineage identifiers are opaque tokens; only the odb suffix is checked.
    RE.get_or_init(|| Regex::new(r"^[a-z0-9_]+_odb\d+$").unwrap())
}

fn section(report: &mut Vec<String>, title: &str) {
    report.push(format!("{}{}{}", HEADER_RULE, title, HEADER_RULE));
}

fn ok(report: &mut Vec<String>, msg: &str) {
    report.push(format!("{}{}", BULLET_OK, msg));
}

fn fix(report: &mut Vec<String>, errors: &mut usize, msg: &str) {
    report.push(format!("{}{}", BULLET_FIX, msg));
    *errors += 1;
}

/// Validate `raw` and build the typed configuration.
///
/// `default_basedir` is used when the file and CLI both left Basedir unset.
pub fn validate(raw: &RawConfig, default_basedir: PathBuf) -> ConfigReport {
    let mut report = Vec::new();
    let mut errors = 0usize;

    section(&mut report, "Checking if all required inputs are present");
    let id = match raw.id.as_deref().map(str::trim) {
        None => {
            fix(&mut report, &mut errors, "Field ID is required");
            None
        }
        Some("") => {
            fix(&mut report, &mut errors, "Field ID is empty");
            None
        }
        // Whitespace inside the identifier would break the report columns.
        Some(id) => Some(id.split_whitespace().collect::<Vec<_>>().join("_")),
    };
    for (field, path) in [("Assembly", &raw.assembly), ("Annotation", &raw.annotation)] {
        match path {
            None => fix(
                &mut report,
                &mut errors,
                &format!("Field {} is required", field),
            ),
            Some(path) if !path.is_file() => fix(
                &mut report,
                &mut errors,
                &format!("Path for field {} doesn't exist: {}", field, path.display()),
            ),
            Some(_) => {}
        }
    }
    if errors == 0 {
        ok(&mut report, "All required inputs are present");
    }

    section(&mut report, "Checking if all analysis are valid");
    let mut analyses = Vec::new();
    if raw.analysis.is_empty() {
        fix(
            &mut report,
            &mut errors,
            "No analysis found in YAML config file",
        );
    } else {
        let before = errors;
        for name in &raw.analysis {
            match name.parse::<Analysis>() {
                Ok(analysis) => {
                    if !analyses.contains(&analysis) {
                        analyses.push(analysis);
                    }
                }
                Err(unknown) => fix(&mut report, &mut errors, &unknown.to_string()),
            }
        }
        if errors == before {
            ok(&mut report, "All analysis are valid");
        }
    }

    if analyses.contains(&Analysis::Busco) {
        section(&mut report, "Checking if BUSCO lineages are valid");
        if raw.busco_lineages.is_empty() {
            fix(&mut report, &mut errors, "BUSCO_lineages field is not defined");
        } else {
            let before = errors;
            for lineage in &raw.busco_lineages {
                if !lineage_shape().is_match(lineage) {
                    fix(
                        &mut report,
                        &mut errors,
                        &format!("BUSCO lineage {} doesn't exist", lineage),
                    );
                }
            }
            if errors == before {
                ok(&mut report, "BUSCO lineages are valid");
            }
        }
    }

    if analyses.contains(&Analysis::Omark) {
        section(&mut report, "Checking if OMARK taxid is valid");
        match raw.omark_taxid.as_deref().map(str::trim) {
            None | Some("") => fix(&mut report, &mut errors, "OMARK_taxid field is not defined"),
            Some(taxid) => match taxid.parse::<u64>() {
                Ok(n) if n > 0 => ok(&mut report, "Taxid for OMARK is valid"),
                _ => fix(
                    &mut report,
                    &mut errors,
                    &format!("NCBI taxid {} is not valid", taxid),
                ),
            },
        }
        section(&mut report, "Checking if OMARK db is available");
        match &raw.omark_db {
            None => fix(&mut report, &mut errors, "OMARK_db field is not defined"),
            Some(path) if !path.is_file() => fix(
                &mut report,
                &mut errors,
                &format!("OMARK_db database {} doesn't exist", path.display()),
            ),
            Some(path) => ok(&mut report, &format!("OMARK_db {} found", path.display())),
        }
    }

    if analyses.contains(&Analysis::Detenga) {
        section(&mut report, "Checking if DeTEnGA db is available");
        match raw.detenga_db.as_deref() {
            None | Some("") => fix(&mut report, &mut errors, "DETENGA_db field is not defined"),
            Some(db) if !DETENGA_DBS.contains(&db) => fix(
                &mut report,
                &mut errors,
                &format!(
                    "DETENGA_db database {} doesn't exist. Available options are {}",
                    db,
                    DETENGA_DBS.join(",")
                ),
            ),
            Some(db) => ok(&mut report, &format!("DETENGA_db {} found", db)),
        }
        match &raw.detenga_pfams {
            None => fix(&mut report, &mut errors, "DETENGA_pfams field is not defined"),
            Some(path) if !path.is_file() => fix(
                &mut report,
                &mut errors,
                &format!("TE Pfam table {} doesn't exist", path.display()),
            ),
            Some(_) => {}
        }
    }

    if analyses.contains(&Analysis::Prothomology) {
        section(&mut report, "Checking if protein databases exist");
        if raw.prothomology_tags.is_empty() {
            fix(
                &mut report,
                &mut errors,
                "PROTHOMOLOGY_tags field is not defined",
            );
        } else {
            let before = errors;
            for entry in &raw.prothomology_tags {
                for (tag, path) in entry {
                    if !path.is_file() {
                        fix(
                            &mut report,
                            &mut errors,
                            &format!("Protein database for tag {} doesn't exist", tag),
                        );
                    }
                }
            }
            if errors == before {
                ok(&mut report, "All protein databases are valid");
            }
        }
    }

    if analyses.contains(&Analysis::Rnaseq) {
        section(&mut report, "Checking if RNA-seq alignments exist");
        match &raw.rnaseq_alignments {
            None => fix(
                &mut report,
                &mut errors,
                "RNASEQ_alignments field is not defined",
            ),
            Some(path) if !path.is_file() => fix(
                &mut report,
                &mut errors,
                &format!("Alignment file {} doesn't exist", path.display()),
            ),
            Some(_) => ok(&mut report, "RNA-seq alignments found"),
        }
    }

    let text = report.join("\n");
    if errors > 0 {
        return ConfigReport { text, config: None };
    }

    let mut prothomology_tags = Vec::new();
    for entry in &raw.prothomology_tags {
        for (tag, path) in entry {
            prothomology_tags.push(ProteinDatabase {
                tag: tag.clone(),
                path: path.clone(),
            });
        }
    }

    let config = PipelineConfig {
        // All unwraps above were validated; fields below are plain copies.
        id: id.unwrap_or_default(),
        assembly: raw.assembly.clone().unwrap_or_default(),
        annotation: raw.annotation.clone().unwrap_or_default(),
        basedir: raw.basedir.clone().unwrap_or(default_basedir),
        analyses,
        threads: raw.threads,
        busco_lineages: raw.busco_lineages.clone(),
        omark_db: raw.omark_db.clone(),
        omark_taxid: raw.omark_taxid.clone(),
        detenga_db: raw.detenga_db.clone(),
        detenga_pfams: raw.detenga_pfams.clone(),
        prothomology_tags,
        rnaseq_alignments: raw.rnaseq_alignments.clone(),
        disable_busco_filter: raw.disable_busco_filter,
    };

    ConfigReport {
        text,
        config: Some(config),
    }
}

/// Default output directory: `AnnotationQC_<timestamp>` under the cwd.
pub fn default_basedir() -> PathBuf {
    let suffix = chrono::Local::now().format("%Y%m%dT%H%M%S");
    PathBuf::from(format!("AnnotationQC_{}", suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn raw_with_inputs(dir: &TempDir) -> RawConfig {
        let assembly = dir.path().join("genome.fasta");
        let annotation = dir.path().join("annot.gff3");
        fs::write(&assembly, ">chr1\nACGT\n").unwrap();
        fs::write(&annotation, "##gff-version 3\n").unwrap();
        RawConfig {
            id: Some("Arabidopsis thaliana".to_string()),
            assembly: Some(assembly),
            annotation: Some(annotation),
            analysis: vec!["AGAT".to_string()],
            ..RawConfig::default()
        }
    }

    #[test]
    fn valid_config_passes_and_normalizes_id() {
        let dir = tempfile::tempdir().unwrap();
        let raw = raw_with_inputs(&dir);
        let report = validate(&raw, dir.path().join("out"));
        assert!(report.is_ok(), "{}", report.text);
        let config = report.config.unwrap();
        assert_eq!(config.id, "Arabidopsis_thaliana");
        assert_eq!(config.basedir, dir.path().join("out"));
        assert_eq!(config.ordered_analyses(), vec![Analysis::Agat]);
    }

    #[test]
    fn missing_inputs_are_aggregated() {
        let raw = RawConfig::default();
        let report = validate(&raw, PathBuf::from("out"));
        assert!(!report.is_ok());
        assert!(report.text.contains("Field ID is required"));
        assert!(report.text.contains("Field Assembly is required"));
        assert!(report.text.contains("Field Annotation is required"));
        assert!(report.text.contains("No analysis found"));
    }

    #[test]
    fn unknown_analysis_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_with_inputs(&dir);
        raw.analysis.push("BLAST".to_string());
        let report = validate(&raw, dir.path().join("out"));
        assert!(!report.is_ok());
        assert!(report.text.contains("BLAST is not a valid analysis"));
    }

    #[test]
    fn busco_requires_plausible_lineages() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_with_inputs(&dir);
        raw.analysis = vec!["BUSCO".to_string()];
        raw.busco_lineages = vec!["eudicots_odb10".to_string(), "NotALineage".to_string()];
        let report = validate(&raw, dir.path().join("out"));
        assert!(!report.is_ok());
        assert!(report.text.contains("NotALineage doesn't exist"));
    }

    #[test]
    fn detenga_validates_db_choice() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_with_inputs(&dir);
        raw.analysis = vec!["DETENGA".to_string()];
        raw.detenga_db = Some("rexdb-fungi".to_string());
        let report = validate(&raw, dir.path().join("out"));
        assert!(!report.is_ok());
        assert!(report.text.contains("rexdb-fungi"));
        assert!(report.text.contains("rexdb-plant"));
    }

    #[test]
    fn omark_taxid_must_be_numeric() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_with_inputs(&dir);
        raw.analysis = vec!["OMARK".to_string()];
        raw.omark_taxid = Some("not-a-taxid".to_string());
        raw.omark_db = Some(dir.path().join("missing.h5"));
        let report = validate(&raw, dir.path().join("out"));
        assert!(!report.is_ok());
        assert!(report.text.contains("not-a-taxid is not valid"));
        assert!(report.text.contains("missing.h5"));
    }

    #[test]
    fn ordered_analyses_follow_canonical_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_with_inputs(&dir);
        raw.analysis = vec![
            "PROTHOMOLOGY".to_string(),
            "AGAT".to_string(),
            "PSAURON".to_string(),
        ];
        let db = dir.path().join("sp.dmnd");
        fs::write(&db, "db").unwrap();
        raw.prothomology_tags = vec![[("swissprot".to_string(), db)].into_iter().collect()];
        let report = validate(&raw, dir.path().join("out"));
        let config = report.config.unwrap();
        assert_eq!(
            config.ordered_analyses(),
            vec![Analysis::Agat, Analysis::Psauron, Analysis::Prothomology]
        );
    }
}
