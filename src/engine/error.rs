//! Pipeline error types

/// Errors that abort a pipeline run.
///
/// Per-step tool failures inside optional analyses are not errors at this
/// level; they degrade to FAILED sentinels in the report. Only pre-flight
/// problems and failed mandatory pre-stages surface here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Mandatory stage {stage} failed: {detail}")]
    MandatoryStageFailed { stage: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
