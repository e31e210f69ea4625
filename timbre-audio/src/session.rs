//! One instrument: its effect bus, selected source and envelope overrides.
//!
//! Lifecycle: `Uninitialized -> Active <-> Stopped`, and `Terminated` from
//! any of them. Construction moves the session to `Active` after the shared
//! server is up and the effect synth is created. A host stop parks it in
//! `Stopped` until the host resumes it; destroy and delete move it to
//! `Terminated`, which is final. Both stopping and terminating quit the server.
//!
//! Properties are stored in atomics (f32 as u32 bits), so a setter on one
//! thread and a play call on another never see a torn value; an envelope
//! change applies from the next play onward.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use timbre_types::{
    sanitize, sanitize_bounded, ArgValue, BusId, DiagnosticCode, EnvelopeParams, NodeId, Severity,
    Source, PERCENTAGE_MAX, USE_ENGINE_DEFAULT,
};

use crate::compose::{compose, compose_effect_setup, NoteRouting};
use crate::context::SynthContext;
use crate::interpreter::interpret;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Stopped,
    Terminated,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SessionState::Uninitialized,
            1 => SessionState::Active,
            2 => SessionState::Stopped,
            _ => SessionState::Terminated,
        }
    }
}

/// Host lifecycle signals, translated by the host adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Resume,
    Stop,
    Destroy,
    Delete,
}

/// An f32 readable and writable from any thread.
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }
}

struct EnvelopeCell {
    attack: AtomicF32,
    decay: AtomicF32,
    sustain: AtomicF32,
    release: AtomicF32,
    reverb: AtomicF32,
}

impl EnvelopeCell {
    fn new(env: EnvelopeParams) -> Self {
        let env = env.sanitized();
        Self {
            attack: AtomicF32::new(env.attack),
            decay: AtomicF32::new(env.decay),
            sustain: AtomicF32::new(env.sustain),
            release: AtomicF32::new(env.release),
            reverb: AtomicF32::new(env.reverb),
        }
    }

    fn snapshot(&self) -> EnvelopeParams {
        EnvelopeParams {
            attack: self.attack.load(),
            decay: self.decay.load(),
            sustain: self.sustain.load(),
            release: self.release.load(),
            reverb: self.reverb.load(),
        }
    }
}

pub struct InstrumentSession {
    ctx: Arc<SynthContext>,
    effect_bus: BusId,
    effect_node: NodeId,
    source: AtomicU8,
    envelope: EnvelopeCell,
    state: AtomicU8,
}

impl InstrumentSession {
    /// Create a session playing the default source.
    pub fn new(ctx: Arc<SynthContext>) -> Self {
        Self::with_source(ctx, Source::default())
    }

    pub fn with_source(ctx: Arc<SynthContext>, source: Source) -> Self {
        let session = Self {
            effect_bus: ctx.ids().next_bus_id(),
            effect_node: ctx.ids().next_note_id(),
            ctx,
            source: AtomicU8::new(source.index()),
            envelope: EnvelopeCell::new(EnvelopeParams::default()),
            state: AtomicU8::new(SessionState::Uninitialized as u8),
        };
        session.setup();
        session
    }

    fn setup(&self) {
        self.ctx.ensure_backend();
        log::debug!(
            target: "timbre::session",
            "setting up bus {} as effect bus (effect node {})",
            self.effect_bus,
            self.effect_node
        );
        self.ctx
            .send(compose_effect_setup(self.effect_node, self.effect_bus));
        self.state.store(SessionState::Active as u8, Ordering::SeqCst);
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn effect_bus(&self) -> BusId {
        self.effect_bus
    }

    pub fn effect_node(&self) -> NodeId {
        self.effect_node
    }

    pub fn routing(&self) -> NoteRouting {
        NoteRouting {
            source: self.source(),
            effect_node: self.effect_node,
            effect_bus: self.effect_bus,
        }
    }

    /// Play one note described by an untyped argument list.
    ///
    /// Outcomes are observable only through emitted messages and diagnostics.
    pub fn play(&self, args: &[ArgValue]) {
        match self.state() {
            SessionState::Terminated => {
                self.ctx.diagnose(
                    Severity::Warning,
                    DiagnosticCode::SessionTerminated,
                    "play ignored: instrument has been shut down",
                );
                return;
            }
            SessionState::Stopped => {
                self.ctx.diagnose(
                    Severity::Warning,
                    DiagnosticCode::SessionStopped,
                    "play ignored: instrument is stopped until resumed",
                );
                return;
            }
            SessionState::Uninitialized | SessionState::Active => {}
        }
        let Ok(request) = interpret(args, self.envelope(), self.ctx.sink()) else {
            return;
        };
        let note_id = self.ctx.ids().next_note_id();
        let routing = self.routing();
        log::debug!(
            target: "timbre::session",
            "playing note: synthdef = {}, node = {}, freq = {}, dur = {}, vol = {}",
            routing.source.synth_def(),
            note_id,
            request.frequency_hz,
            request.duration_secs(),
            request.gain()
        );
        self.ctx.send(compose(&request, note_id, &routing));
    }

    /// Translate a host lifecycle signal.
    pub fn handle_event(&self, event: HostEvent) {
        match event {
            HostEvent::Resume => self.resume(),
            HostEvent::Stop => self.stop(),
            HostEvent::Destroy | HostEvent::Delete => self.terminate(),
        }
    }

    /// Park an active session and tell the server to quit.
    pub fn stop(&self) {
        let _ = self.state.compare_exchange(
            SessionState::Active as u8,
            SessionState::Stopped as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        self.ctx.send_quit();
    }

    /// Bring the server back if it ended and reactivate a stopped session.
    /// The bus and effect node allocated at construction are kept.
    pub fn resume(&self) {
        self.ctx.restart_if_ended();
        if self
            .state
            .compare_exchange(
                SessionState::Stopped as u8,
                SessionState::Active as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            log::debug!(target: "timbre::session", "resumed instrument on bus {}", self.effect_bus);
        }
    }

    /// Move to `Terminated` and tell the server to quit. The quit is sent on
    /// every call; the server ignores it once it has stopped.
    pub fn terminate(&self) {
        self.state
            .store(SessionState::Terminated as u8, Ordering::SeqCst);
        self.ctx.send_quit();
    }

    // ─── Properties ──────────────────────────────────────────────────

    pub fn source(&self) -> Source {
        Source::from_index(self.source.load(Ordering::Relaxed))
    }

    /// Select a source by name. Unknown names keep the current source and
    /// raise a user-visible notice; returns whether the value was accepted.
    pub fn set_source(&self, name: &str) -> bool {
        match Source::from_name(name) {
            Some(source) => {
                self.source.store(source.index(), Ordering::Relaxed);
                true
            }
            None => {
                self.ctx.diagnose(
                    Severity::Notice,
                    DiagnosticCode::InvalidSource,
                    format!(
                        "an illegal value was entered for Source ({:?}); keeping {}",
                        name,
                        self.source()
                    ),
                );
                false
            }
        }
    }

    pub fn envelope(&self) -> EnvelopeParams {
        self.envelope.snapshot()
    }

    fn store_checked(&self, cell: &AtomicF32, name: &str, requested: f32, stored: f32) {
        cell.store(stored);
        if stored.to_bits() != requested.to_bits() {
            self.ctx.diagnose(
                Severity::Notice,
                DiagnosticCode::ValueClamped,
                format!("{} {} is out of range; using {}", name, requested, stored),
            );
        }
    }

    pub fn attack(&self) -> f32 {
        self.envelope.attack.load()
    }

    /// Attack in milliseconds, or [`USE_ENGINE_DEFAULT`].
    pub fn set_attack(&self, ms: f32) {
        self.store_checked(&self.envelope.attack, "attack", ms, sanitize(ms));
    }

    pub fn decay(&self) -> f32 {
        self.envelope.decay.load()
    }

    pub fn set_decay(&self, ms: f32) {
        self.store_checked(&self.envelope.decay, "decay", ms, sanitize(ms));
    }

    pub fn sustain(&self) -> f32 {
        self.envelope.sustain.load()
    }

    pub fn set_sustain(&self, ms: f32) {
        self.store_checked(&self.envelope.sustain, "sustain", ms, sanitize(ms));
    }

    pub fn release(&self) -> f32 {
        self.envelope.release.load()
    }

    pub fn set_release(&self, ms: f32) {
        self.store_checked(&self.envelope.release, "release", ms, sanitize(ms));
    }

    pub fn reverb(&self) -> f32 {
        self.envelope.reverb.load()
    }

    /// Reverb wetness in percent (0 to 100), or [`USE_ENGINE_DEFAULT`].
    pub fn set_reverb(&self, percent: f32) {
        self.store_checked(
            &self.envelope.reverb,
            "reverb",
            percent,
            sanitize_bounded(percent, PERCENTAGE_MAX),
        );
    }

    /// Reset every envelope field to the engine default.
    pub fn clear_envelope(&self) {
        for cell in [
            &self.envelope.attack,
            &self.envelope.decay,
            &self.envelope.sustain,
            &self.envelope.release,
            &self.envelope.reverb,
        ] {
            cell.store(USE_ENGINE_DEFAULT);
        }
    }
}
