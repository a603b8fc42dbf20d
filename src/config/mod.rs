//! Run configuration
//!
//! - `raw` - the YAML file as written, plus CLI overrides
//! - `analysis` - the stage enumeration and canonical order
//! - `validate` - aggregated validation and the typed [`PipelineConfig`]
//! - `dependencies` - external binary pre-flight checks

pub mod analysis;
pub mod dependencies;
pub mod raw;
pub mod validate;

pub use analysis::{Analysis, CANONICAL_ORDER};
pub use dependencies::{check_dependencies, DependencyReport};
pub use raw::{CliOverrides, RawConfig};
pub use validate::{default_basedir, validate, ConfigReport, PipelineConfig, ProteinDatabase};
