use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Short machine-friendly tag, usually the emitting stage.
    pub category: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)
    }
}

/// Collects the non-fatal records produced during a run.
///
/// Every record is also forwarded to `tracing` as it arrives, so callers that
/// only care about logs can ignore the sink entirely.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Diagnostic) {
        match record.severity {
            Severity::Info => info!(category = %record.category, "{}", record.message),
            Severity::Warning => warn!(category = %record.category, "{}", record.message),
            Severity::Error => error!(category = %record.category, "{}", record.message),
        }
        self.records.push(record);
    }

    pub fn info(&mut self, category: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Info, category, message);
    }

    pub fn warn(&mut self, category: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Warning, category, message);
    }

    pub fn error(&mut self, category: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Error, category, message);
    }

    fn record(
        &mut self,
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic {
            severity,
            category: category.into(),
            message: message.into(),
        });
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.records
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records
            .iter()
            .filter(|r| r.severity == Severity::Warning)
    }

    /// Number of records at or above `min` per category.
    pub fn summary(&self, min: Severity) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records.iter().filter(|r| r.severity >= min) {
            *counts.entry(record.category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
