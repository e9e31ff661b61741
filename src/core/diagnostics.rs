//! Recoverable expansion diagnostics and the sinks that receive them.
//!
//! Nothing here is fatal: the expander reports and keeps going.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A subtask step names a task absent from the registry; the step is dropped.
    #[error("task '{task}' referenced by {} does not exist, ignoring reference", origin(.referenced_by))]
    UnresolvedReference {
        task: String,
        referenced_by: Option<String>,
    },

    /// A subtask step re-enters a task that is still being expanded; its
    /// body is spliced as-is and the expansion may be incomplete.
    #[error("task '{task}' referenced by {} is already being expanded, inlining it unexpanded", origin(.referenced_by))]
    CyclicReference {
        task: String,
        referenced_by: Option<String>,
    },
}

fn origin(referenced_by: &Option<String>) -> String {
    match referenced_by {
        Some(id) => format!("task '{}'", id),
        None => "the root node".to_string(),
    }
}

impl Diagnostic {
    /// Id of the referenced task.
    pub fn task(&self) -> &str {
        match self {
            Self::UnresolvedReference { task, .. } | Self::CyclicReference { task, .. } => task,
        }
    }

    /// Id of the task whose tree holds the reference, if any.
    pub fn referenced_by(&self) -> Option<&str> {
        match self {
            Self::UnresolvedReference { referenced_by, .. }
            | Self::CyclicReference { referenced_by, .. } => referenced_by.as_deref(),
        }
    }
}

/// Receives diagnostics for the duration of one expansion pass.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` as warnings and keeps per-kind counts.
#[derive(Debug, Default)]
pub struct TracingSink {
    pub unresolved: usize,
    pub cyclic: usize,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.unresolved + self.cyclic
    }
}

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::UnresolvedReference { .. } => self.unresolved += 1,
            Diagnostic::CyclicReference { .. } => self.cyclic += 1,
        }
        tracing::warn!(
            task = diagnostic.task(),
            referenced_by = diagnostic.referenced_by(),
            "{}",
            diagnostic
        );
    }
}
