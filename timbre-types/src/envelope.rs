use serde::{Deserialize, Serialize};

/// Reserved value meaning "leave the parameter at the synth definition's own default".
pub const USE_ENGINE_DEFAULT: f32 = -1.0;

/// Ceiling for percentage-valued parameters (reverb).
pub const PERCENTAGE_MAX: f32 = 100.0;

/// Floor `value` at zero, passing the sentinel through untouched.
pub fn sanitize(value: f32) -> f32 {
    if value == USE_ENGINE_DEFAULT {
        value
    } else {
        value.max(0.0)
    }
}

/// Like [`sanitize`], additionally capped at `max`.
pub fn sanitize_bounded(value: f32, max: f32) -> f32 {
    if value == USE_ENGINE_DEFAULT {
        value
    } else {
        sanitize(value).min(max)
    }
}

/// Envelope and effect overrides for an instrument.
///
/// Attack, decay, sustain and release are in milliseconds, reverb is a
/// percentage. Each field is either [`USE_ENGINE_DEFAULT`] or a sanitized value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub reverb: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: USE_ENGINE_DEFAULT,
            decay: USE_ENGINE_DEFAULT,
            sustain: USE_ENGINE_DEFAULT,
            release: USE_ENGINE_DEFAULT,
            reverb: USE_ENGINE_DEFAULT,
        }
    }
}

impl EnvelopeParams {
    /// Apply the sanitizer to every field.
    pub fn sanitized(self) -> Self {
        Self {
            attack: sanitize(self.attack),
            decay: sanitize(self.decay),
            sustain: sanitize(self.sustain),
            release: sanitize(self.release),
            reverb: sanitize_bounded(self.reverb, PERCENTAGE_MAX),
        }
    }

    /// True when no field overrides the engine default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Whether `value` is an explicit override rather than the sentinel.
pub fn is_override(value: f32) -> bool {
    value != USE_ENGINE_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_passes_through() {
        assert_eq!(sanitize(USE_ENGINE_DEFAULT), USE_ENGINE_DEFAULT);
        assert_eq!(sanitize_bounded(USE_ENGINE_DEFAULT, 100.0), USE_ENGINE_DEFAULT);
    }

    #[test]
    fn negatives_floor_at_zero() {
        assert_eq!(sanitize(-5.0), 0.0);
        assert_eq!(sanitize(-0.5), 0.0);
        assert_eq!(sanitize_bounded(-5.0, 100.0), 0.0);
    }

    #[test]
    fn bounded_caps_at_max() {
        assert_eq!(sanitize_bounded(150.0, PERCENTAGE_MAX), 100.0);
        assert_eq!(sanitize_bounded(42.0, PERCENTAGE_MAX), 42.0);
        assert_eq!(sanitize_bounded(80.0, 50.0), 50.0);
    }

    #[test]
    fn unbounded_keeps_large_values() {
        assert_eq!(sanitize(10_000.0), 10_000.0);
    }

    #[test]
    fn nan_becomes_zero() {
        assert_eq!(sanitize(f32::NAN), 0.0);
    }

    #[test]
    fn default_is_all_sentinel() {
        let env = EnvelopeParams::default();
        assert!(env.is_default());
        assert!(!is_override(env.attack));
        assert!(!is_override(env.reverb));
    }

    #[test]
    fn sanitized_applies_per_field_rules() {
        let env = EnvelopeParams {
            attack: -3.0,
            decay: 20.0,
            sustain: USE_ENGINE_DEFAULT,
            release: 400.0,
            reverb: 250.0,
        }
        .sanitized();
        assert_eq!(env.attack, 0.0);
        assert_eq!(env.decay, 20.0);
        assert_eq!(env.sustain, USE_ENGINE_DEFAULT);
        assert_eq!(env.release, 400.0);
        assert_eq!(env.reverb, 100.0);
    }
}
