//! Pipeline run context
//!
//! Derived artifact paths published by the mandatory pre-stages for every
//! later stage to read. The base configuration stays immutable; this record
//! is the only thing stages append to, and existing fields are never
//! removed or rewritten once set.

use std::path::{Path, PathBuf};

/// FASTA files produced by the gffread extraction pre-stage.
#[derive(Debug, Clone)]
pub struct ExtractedSequences {
    pub cds: PathBuf,
    pub proteins: PathBuf,
    pub mrna: PathBuf,
    pub cds_longest: PathBuf,
    pub proteins_longest: PathBuf,
    pub mrna_longest: PathBuf,
    /// Longest-isoform proteins with deduplicated headers, for BUSCO.
    pub proteins_busco: PathBuf,
}

/// Artifacts accumulated while the pre-stages run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Annotation with `transcript` records rewritten to `mRNA`. All later
    /// stages read this, never the raw input annotation.
    pub annotation: PathBuf,
    /// Assembly actually in use; replaced by the seqtk-reformatted copy when
    /// the input had non-standard sequence line lengths.
    pub assembly: PathBuf,
    /// Longest-isoform-only annotation, set by the longest-isoform pre-stage.
    pub longest_isoform_annotation: Option<PathBuf>,
    /// Set by the gffread extraction pre-stage.
    pub extracted: Option<ExtractedSequences>,
}

impl RunContext {
    pub fn new(annotation: impl Into<PathBuf>, assembly: impl Into<PathBuf>) -> Self {
        Self {
            annotation: annotation.into(),
            assembly: assembly.into(),
            longest_isoform_annotation: None,
            extracted: None,
        }
    }

    pub fn longest_isoform(&self) -> &Path {
        self.longest_isoform_annotation
            .as_deref()
            .unwrap_or(&self.annotation)
    }
}
