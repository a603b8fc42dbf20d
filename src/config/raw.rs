//! Raw configuration file
//!
//! The YAML file as written by the user, before validation. Every field is
//! optional at this layer so that missing or malformed values can be
//! aggregated into one readable report instead of failing on the first one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,

    #[serde(rename = "Assembly", default)]
    pub assembly: Option<PathBuf>,

    #[serde(rename = "Annotation", default)]
    pub annotation: Option<PathBuf>,

    #[serde(rename = "Basedir", default)]
    pub basedir: Option<PathBuf>,

    #[serde(rename = "Analysis", default)]
    pub analysis: Vec<String>,

    #[serde(rename = "Threads", default = "default_threads")]
    pub threads: usize,

    #[serde(rename = "BUSCO_lineages", default)]
    pub busco_lineages: Vec<String>,

    #[serde(rename = "OMARK_db", default)]
    pub omark_db: Option<PathBuf>,

    #[serde(rename = "OMARK_taxid", default)]
    pub omark_taxid: Option<String>,

    #[serde(rename = "DETENGA_db", default)]
    pub detenga_db: Option<String>,

    /// Table of rexdb Pfam accessions marking transposon domains, in the
    /// two-column `PFxxxxx  description` format shipped with TEsorter.
    #[serde(rename = "DETENGA_pfams", default)]
    pub detenga_pfams: Option<PathBuf>,

    /// One single-key `tag: database` mapping per entry.
    #[serde(rename = "PROTHOMOLOGY_tags", default)]
    pub prothomology_tags: Vec<HashMap<String, PathBuf>>,

    #[serde(rename = "RNASEQ_alignments", default)]
    pub rnaseq_alignments: Option<PathBuf>,

    #[serde(skip)]
    pub disable_busco_filter: bool,
}

fn default_threads() -> usize {
    1
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            id: None,
            assembly: None,
            annotation: None,
            basedir: None,
            analysis: Vec::new(),
            threads: default_threads(),
            busco_lineages: Vec::new(),
            omark_db: None,
            omark_taxid: None,
            detenga_db: None,
            detenga_pfams: None,
            prothomology_tags: Vec::new(),
            rnaseq_alignments: None,
            disable_busco_filter: false,
        }
    }
}

impl RawConfig {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| PipelineError::Yaml {
            file: path.display().to_string(),
            error: e,
        })
    }

    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(species) = &overrides.species {
            self.id = Some(species.clone());
        }
        if let Some(genome) = &overrides.genome {
            self.assembly = Some(genome.clone());
        }
        if let Some(annotation) = &overrides.annotation {
            self.annotation = Some(annotation.clone());
        }
        if let Some(taxid) = &overrides.taxid {
            self.omark_taxid = Some(taxid.clone());
        }
        if let Some(outbase) = &overrides.outbase {
            self.basedir = Some(outbase.clone());
        }
        self.disable_busco_filter = overrides.disable_busco_filter;
    }
}

/// Command-line values that take precedence over the YAML file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub species: Option<String>,
    pub genome: Option<PathBuf>,
    pub annotation: Option<PathBuf>,
    pub taxid: Option<String>,
    pub outbase: Option<PathBuf>,
    pub disable_busco_filter: bool,
}
