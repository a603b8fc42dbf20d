//! Execution result types
//!
//! Every external tool invocation produces a [`StepResult`]; a stage bundles
//! its sub-steps into a [`StageReport`]; parsed metrics accumulate in a
//! [`MetricsRow`] that becomes one line of the final TSV report.

use std::fmt;
use std::path::PathBuf;

/// Outcome of one sub-step, with the diagnostic text embedded.
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    /// Tool exited 0 (or an internal step completed).
    Success(String),
    /// Tool exited nonzero; carries the captured stderr/stdout.
    Failed(String),
    /// The expected output artifact already existed, so nothing ran.
    AlreadyDone(String),
}

impl StepStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepStatus::Failed(_))
    }

    pub fn is_already_done(&self) -> bool {
        matches!(self, StepStatus::AlreadyDone(_))
    }

    /// The embedded status message, whatever the variant.
    pub fn message(&self) -> &str {
        match self {
            StepStatus::Success(msg) | StepStatus::Failed(msg) | StepStatus::AlreadyDone(msg) => {
                msg
            }
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a single step execution. Immutable once produced.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The exact command line that ran (or would have run).
    pub command: String,
    pub status: StepStatus,
    /// The expected output artifact, when the step defines one.
    pub output: Option<PathBuf>,
}

impl StepResult {
    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }

    /// Path to the step's artifact; errors if the step declared none.
    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output.as_ref()
    }
}

/// Mapping of sub-step name to [`StepResult`], preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    steps: Vec<(String, StepResult)>,
}

impl StageReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, result: StepResult) {
        self.steps.push((name.into(), result));
    }

    pub fn get(&self, name: &str) -> Option<&StepResult> {
        self.steps
            .iter()
            .find(|(step, _)| step == name)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StepResult)> {
        self.steps
            .iter()
            .map(|(name, result)| (name.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True if any sub-step in the stage failed.
    pub fn any_failed(&self) -> bool {
        self.steps.iter().any(|(_, result)| result.is_failed())
    }
}

/// A single scalar metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Count(i64),
    Score(f64),
    Text(String),
}

impl MetricValue {
    /// The sentinel substituted for metrics whose upstream step failed.
    pub fn failed() -> Self {
        MetricValue::Text("FAILED".to_string())
    }

    pub fn na() -> Self {
        MetricValue::Text("NA".to_string())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Score(v) => write!(f, "{}", v),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(n: i64) -> Self {
        MetricValue::Count(n)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Score(v)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(s: String) -> Self {
        MetricValue::Text(s)
    }
}

/// Insertion-ordered metric name → value mapping.
///
/// Each parser owns a disjoint key namespace; a duplicate insert keeps the
/// first value and logs a warning instead of silently overwriting.
#[derive(Debug, Clone, Default)]
pub struct MetricsRow {
    entries: Vec<(String, MetricValue)>,
}

impl MetricsRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) {
        let key = key.into();
        if self.entries.iter().any(|(existing, _)| *existing == key) {
            tracing::warn!(metric = %key, "duplicate metric key ignored");
            return;
        }
        self.entries.push((key, value.into()));
    }

    /// Append every entry of `other`, with the same duplicate-key guard.
    pub fn merge(&mut self, other: MetricsRow) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &MetricValue> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
