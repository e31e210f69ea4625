#![allow(dead_code)]
//! Test harness utilities for timbre-audio integration tests.

use std::sync::Arc;

use timbre_audio::{
    AssetDelivery, InstrumentSession, MemorySink, NoAssets, SynthContext, TestBackend,
};
use timbre_types::{ArgValue, ControlMessage, RawArg};

/// A context wired to a recording backend and an in-memory sink.
pub struct Harness {
    pub backend: Arc<TestBackend>,
    pub sink: Arc<MemorySink>,
    pub ctx: Arc<SynthContext>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_assets(Box::new(NoAssets))
    }

    pub fn with_assets(assets: Box<dyn AssetDelivery>) -> Self {
        let backend = Arc::new(TestBackend::new());
        let sink = Arc::new(MemorySink::new());
        let ctx = Arc::new(SynthContext::new(backend.clone(), assets, sink.clone()));
        Self { backend, sink, ctx }
    }

    /// A new session on the shared context, with setup traffic cleared.
    pub fn session(&self) -> InstrumentSession {
        let session = InstrumentSession::new(self.ctx.clone());
        self.backend.clear();
        self.sink.clear();
        session
    }
}

/// Parse a whitespace-separated argument line the way a host would.
pub fn words(line: &str) -> Vec<ArgValue> {
    line.split_whitespace().map(ArgValue::from_word).collect()
}

/// The float value an `/n_set` message carries.
pub fn float_value(message: &ControlMessage) -> Option<f32> {
    match message.args.get(2) {
        Some(RawArg::Float(v)) => Some(*v),
        _ => None,
    }
}

/// The `/n_set` control names of a batch, in order.
pub fn controls(batch: &[ControlMessage]) -> Vec<String> {
    batch
        .iter()
        .filter_map(|m| m.control_name().map(str::to_string))
        .collect()
}
