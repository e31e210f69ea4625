//! Structured diagnostics emitted by the note pipeline.
//!
//! Every non-fatal outcome (discarded request, fallback to defaults, rejected
//! property value) is reported as a [`Diagnostic`] record so hosts and tests
//! can react to it without scraping log text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Debug,
    Info,
    /// Something the user should see (the host shows it, e.g. as a toast).
    Notice,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Empty argument list.
    MissingPitch,
    /// Note-name form without an octave element.
    MissingOctave,
    /// An element was neither text nor a number.
    UnexpectedType,
    /// A note token had no frequency table entry.
    UnknownNote,
    /// A required frequency was unparseable, non-finite or not positive.
    InvalidFrequency,
    /// Optional text did not parse; remaining fields use defaults.
    NumberFormat,
    /// Elements beyond the expected count were ignored.
    ExcessArguments,
    /// Negative duration raised to zero.
    NegativeDuration,
    /// A property setter was given an unknown value and kept the old one.
    InvalidSource,
    /// A property setter clamped an out-of-range value.
    ValueClamped,
    /// A definition file could not be copied to backend storage.
    AssetDeliveryFailed,
    /// The backend could not be started.
    BackendStartFailed,
    /// A composed batch could not be handed to the transport.
    TransportFailed,
    /// A play request reached a terminated session.
    SessionTerminated,
    /// A play request reached a session the host has stopped.
    SessionStopped,
}

impl DiagnosticCode {
    /// Whether a diagnostic with this code means the play request was dropped.
    pub fn aborts_request(self) -> bool {
        matches!(
            self,
            DiagnosticCode::MissingPitch
                | DiagnosticCode::MissingOctave
                | DiagnosticCode::UnexpectedType
                | DiagnosticCode::UnknownNote
                | DiagnosticCode::InvalidFrequency
                | DiagnosticCode::SessionTerminated
                | DiagnosticCode::SessionStopped
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub context: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, context: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            context: context.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {:?}: {}", self.severity, self.code, self.context)
    }
}

/// Destination for diagnostic records. Shared between threads.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_codes() {
        assert!(DiagnosticCode::MissingOctave.aborts_request());
        assert!(DiagnosticCode::UnexpectedType.aborts_request());
        assert!(!DiagnosticCode::NumberFormat.aborts_request());
        assert!(!DiagnosticCode::ExcessArguments.aborts_request());
        assert!(DiagnosticCode::SessionStopped.aborts_request());
    }

    #[test]
    fn severity_orders_by_importance() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Notice > Severity::Info);
    }

    #[test]
    fn display_includes_code_and_context() {
        let d = Diagnostic::new(Severity::Warning, DiagnosticCode::ExcessArguments, "5 > 4");
        assert_eq!(d.to_string(), "[Warning] ExcessArguments: 5 > 4");
    }
}
