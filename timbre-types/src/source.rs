use serde::{Deserialize, Serialize};

/// File extension of compiled synthesis definitions.
pub const SYNTHDEF_EXTENSION: &str = ".scsyndef";

/// Effect definitions every instrument routes its notes through.
pub const EFFECT_DEFS: [&str; 1] = ["reverb"];

/// Sound source an instrument plays with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Sine,
    Saw,
    Triangle,
    Pulse,
    Noise,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Sine,
        Source::Saw,
        Source::Triangle,
        Source::Pulse,
        Source::Noise,
    ];

    /// Name as seen on the property surface.
    pub fn name(&self) -> &'static str {
        match self {
            Source::Sine => "sine",
            Source::Saw => "saw",
            Source::Triangle => "triangle",
            Source::Pulse => "pulse",
            Source::Noise => "noise",
        }
    }

    /// Synth definition played for this source.
    pub fn synth_def(&self) -> &'static str {
        match self {
            Source::Sine => "sine-inst",
            Source::Saw => "saw-inst",
            Source::Triangle => "triangle-inst",
            Source::Pulse => "pulse-inst",
            Source::Noise => "noise-inst",
        }
    }

    /// Exact, case-sensitive match on the property name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Self {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Every definition file (instrument sources then effects) that must be
/// present in the backend's storage directory.
pub fn definition_files() -> Vec<String> {
    Source::ALL
        .iter()
        .map(|s| s.synth_def())
        .chain(EFFECT_DEFS)
        .map(|name| format!("{name}{SYNTHDEF_EXTENSION}"))
        .collect()
}
