use serde::{Deserialize, Serialize};

use crate::envelope::EnvelopeParams;

/// Duration used when the caller supplies none, in milliseconds.
pub const DEFAULT_DURATION_MS: f32 = 500.0;
/// Volume used when the caller supplies none, in percent.
pub const DEFAULT_VOLUME_PERCENT: f32 = 50.0;
pub const MILLIS_PER_SEC: f32 = 1000.0;

/// A fully resolved note ready for message composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayRequest {
    /// Always finite and positive.
    pub frequency_hz: f32,
    /// Never negative.
    pub duration_ms: f32,
    /// Finite; not clamped to 0..=100.
    pub volume_percent: f32,
    pub envelope: EnvelopeParams,
}

impl PlayRequest {
    pub fn duration_secs(&self) -> f32 {
        self.duration_ms / MILLIS_PER_SEC
    }

    /// Volume as a unit gain (percent / 100).
    pub fn gain(&self) -> f32 {
        self.volume_percent / crate::envelope::PERCENTAGE_MAX
    }
}
