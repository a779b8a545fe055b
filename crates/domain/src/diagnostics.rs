//! Internal diagnostics raised by the stores and the session manager.
//!
//! Nothing in the core surfaces an error to its caller; problems are turned
//! into a [`DiagnosticEvent`] and handed to a [`DiagnosticSink`], the seam
//! an external logging collaborator plugs into.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
}

/// Stable identifiers for every diagnostic the core can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticId {
    CannotAccessCookie,
    SessionDateIsZero,
    ErrorParsingSessionRecord,
    FallbackStoreUnavailable,
    CannotReadFallbackStore,
    CannotWriteFallbackStore,
    FailedRemovalFromFallbackStore,
    SetAuthContextFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEvent {
    pub severity: Severity,
    pub id: DiagnosticId,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl DiagnosticEvent {
    pub fn warning(id: DiagnosticId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            id,
            message: message.into(),
            exception: None,
        }
    }

    pub fn critical(id: DiagnosticId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Critical,
            id,
            message: message.into(),
            exception: None,
        }
    }

    pub fn with_exception(mut self, exception: impl std::fmt::Display) -> Self {
        self.exception = Some(exception.to_string());
        self
    }

    /// Log the event through `tracing` as a single JSON payload.
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        match self.severity {
            Severity::Critical => tracing::error!(diagnostic = %json, "sk_diagnostic"),
            Severity::Warning => tracing::warn!(diagnostic = %json, "sk_diagnostic"),
        }
    }
}

/// Receives diagnostics from the core.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn record(&self, event: DiagnosticEvent) {
        (**self).record(event)
    }
}

/// Default sink: forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: DiagnosticEvent) {
        event.emit();
    }
}

/// Sink that keeps every event in memory as well as logging it.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events with the given id.
    pub fn count(&self, id: DiagnosticId) -> usize {
        self.events.lock().iter().filter(|e| e.id == id).count()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn record(&self, event: DiagnosticEvent) {
        event.emit();
        self.events.lock().push(event);
    }
}
