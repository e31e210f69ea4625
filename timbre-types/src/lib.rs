//! # timbre-types
//!
//! Shared data definitions for the timbre note player: note names and the
//! frequency table, untyped play arguments, envelope parameters and their
//! sanitizer, instrument sources, control messages and diagnostics.

pub mod arg;
pub mod diagnostic;
pub mod envelope;
pub mod message;
pub mod note;
pub mod request;
pub mod source;

pub use arg::{ArgValue, NumericError};
pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
pub use envelope::{sanitize, sanitize_bounded, EnvelopeParams, PERCENTAGE_MAX, USE_ENGINE_DEFAULT};
pub use message::{ControlMessage, RawArg};
pub use note::{frequency, Accidental, NoteSpecifier, NoteToken, REFERENCE_OCTAVE};
pub use request::{PlayRequest, DEFAULT_DURATION_MS, DEFAULT_VOLUME_PERCENT, MILLIS_PER_SEC};
pub use source::Source;

/// Identifier of a synth node on the server.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(i32);

impl NodeId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }
    pub fn get(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an audio bus on the server.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct BusId(i32);

impl BusId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }
    pub fn get(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for BusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
