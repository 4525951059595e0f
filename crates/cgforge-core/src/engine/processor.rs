use super::diagnostics::Diagnostics;
use super::error::EngineError;
use crate::core::forcefield::registry::ForceFieldRegistry;
use crate::core::models::system::System;

/// Shared, read-mostly state handed to every processor of a run.
pub struct ProcessContext<'a> {
    pub registry: &'a ForceFieldRegistry,
    pub diagnostics: Diagnostics,
}

impl<'a> ProcessContext<'a> {
    pub fn new(registry: &'a ForceFieldRegistry) -> Self {
        Self {
            registry,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

/// One transformation stage of the pipeline.
///
/// A processor is fully parameterized at construction and mutates the system
/// in place. The system is exclusively owned by the running pipeline and is
/// never shared between threads. A violated precondition is returned as an
/// error and aborts the run; degraded behavior is reported through
/// [`ProcessContext::diagnostics`] instead.
pub trait Processor {
    /// Stable identifier used in logs and errors.
    fn name(&self) -> &'static str;

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError>;
}

/// Fails when there is nothing for `stage` to act on.
pub(crate) fn require_molecules(stage: &'static str, system: &System) -> Result<(), EngineError> {
    if system.is_empty() {
        Err(EngineError::structural(stage, "the system contains no molecules"))
    } else {
        Ok(())
    }
}
