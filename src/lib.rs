//! # GAQET
//!
//! Genome Annotation Quality Evaluation Tools: a sequential pipeline runner
//! that wraps external bioinformatics tools (AGAT, BUSCO, gffread, PSAURON,
//! OMArk, TEsorter/InterProScan, DIAMOND, StringTie/gffcompare, the
//! LTR_retriever family) and aggregates their outputs into one
//! tab-delimited quality report.
//!
//! ## Design
//!
//! - **Step runner** - every external command is memoized on the existence
//!   of its output artifact: if the file is already there the tool is never
//!   re-invoked and the step reports "already done".
//! - **Stage modules** - each analysis composes step-runner invocations in
//!   a fixed order and returns a report with any failure embedded.
//! - **Result parsers** - line-oriented scrapers over the tools' text
//!   outputs; a failed stage degrades to `FAILED` sentinels instead of
//!   aborting the run.
//! - **Controller** - runs the mandatory sequence-extraction pre-stages,
//!   then the requested analyses in canonical order, and writes
//!   `{ID}_GAQET.stats.tsv`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gaqet::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut raw = RawConfig::load(std::path::Path::new("config.yaml"))?;
//!     raw.apply_overrides(&CliOverrides::default());
//!
//!     let report = validate(&raw, default_basedir());
//!     let config = report
//!         .config
//!         .ok_or_else(|| anyhow::anyhow!("invalid configuration:\n{}", report.text))?;
//!
//!     let outcome = Pipeline::new(config).run().await?;
//!     println!("report written to {}", outcome.report_path.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod parsers;
pub mod stages;

// Re-export main types
pub use config::{
    check_dependencies, default_basedir, validate, Analysis, CliOverrides, ConfigReport,
    DependencyReport, PipelineConfig, ProteinDatabase, RawConfig, CANONICAL_ORDER,
};
pub use engine::{
    internal_step, run_step, DiagnosticStream, ExtractedSequences, MetricValue, MetricsRow,
    Pipeline, PipelineError, PipelineOutcome, RunContext, RunLog, RunOptions, StageReport,
    StepResult, StepStatus,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        check_dependencies, default_basedir, validate, Analysis, CliOverrides, PipelineConfig,
        RawConfig,
    };
    pub use crate::engine::{
        MetricValue, MetricsRow, Pipeline, PipelineError, PipelineOutcome, StageReport,
        StepResult, StepStatus,
    };
}
