//! Process-scoped state shared by every instrument session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use timbre_types::message::build_d_load_dir_message;
use timbre_types::source::definition_files;
use timbre_types::{ControlMessage, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};

use crate::assets::AssetDelivery;
use crate::engine::AudioBackend;
use crate::ids::ResourceIds;

/// How long the server gets to confirm a definition load.
const LOAD_TIMEOUT: Duration = Duration::from_secs(2);

struct StartupState {
    assets_delivered: bool,
}

/// The shared backend, id counters, asset delivery and diagnostic sink.
///
/// Construct one per process and hand every session an `Arc` to it.
pub struct SynthContext {
    ids: ResourceIds,
    backend: Arc<dyn AudioBackend>,
    assets: Box<dyn AssetDelivery>,
    sink: Arc<dyn DiagnosticSink>,
    startup: Mutex<StartupState>,
}

impl SynthContext {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        assets: Box<dyn AssetDelivery>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            ids: ResourceIds::new(),
            backend,
            assets,
            sink,
            startup: Mutex::new(StartupState {
                assets_delivered: false,
            }),
        }
    }

    pub fn ids(&self) -> &ResourceIds {
        &self.ids
    }

    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    pub fn diagnose(&self, severity: Severity, code: DiagnosticCode, context: impl Into<String>) {
        self.sink.emit(Diagnostic::new(severity, code, context));
    }

    /// Start the backend if it is not running and, the first time through,
    /// deliver every synth definition (also when an externally managed
    /// server is already up). Whenever definitions were delivered or the
    /// server was (re)started, the server is told to load them before
    /// anything else is sent. Concurrent callers serialize here.
    pub fn ensure_backend(&self) {
        let mut startup = self.startup.lock().unwrap_or_else(|e| e.into_inner());
        let started = self.backend.is_ended() && self.start_backend();
        let first = !startup.assets_delivered;
        if first {
            self.deliver_assets();
            startup.assets_delivered = true;
        }
        if (started || first) && !self.backend.is_ended() {
            self.load_definitions();
        }
    }

    fn start_backend(&self) -> bool {
        log::debug!(target: "timbre::server", "starting synthesis server");
        match self.backend.start() {
            Ok(()) => true,
            Err(e) => {
                log::error!(target: "timbre::server", "server start failed: {}", e);
                self.diagnose(Severity::Error, DiagnosticCode::BackendStartFailed, e.to_string());
                false
            }
        }
    }

    fn deliver_assets(&self) {
        log::debug!(target: "timbre::assets", "delivering synthdefs");
        if let Err(e) = self.assets.prepare() {
            log::error!(
                target: "timbre::assets",
                "{}; the server will not be able to play notes",
                e
            );
            self.diagnose(Severity::Error, DiagnosticCode::AssetDeliveryFailed, e.to_string());
            return;
        }
        for file in definition_files() {
            if let Err(e) = self.assets.deliver(&file) {
                log::error!(target: "timbre::assets", "{}", e);
                self.diagnose(Severity::Error, DiagnosticCode::AssetDeliveryFailed, e.to_string());
            }
        }
    }

    /// `/d_loadDir` the install directory and wait for the server to finish
    /// loading, so the first `/s_new` finds its definition.
    fn load_definitions(&self) {
        let Some(dir) = self.assets.load_dir() else {
            return;
        };
        log::debug!(target: "timbre::assets", "loading synthdefs from {}", dir.display());
        self.send(vec![build_d_load_dir_message(&dir.to_string_lossy())]);
        if let Err(e) = self.backend.sync(LOAD_TIMEOUT) {
            log::warn!(target: "timbre::assets", "synthdef load not confirmed: {}", e);
            self.diagnose(
                Severity::Warning,
                DiagnosticCode::AssetDeliveryFailed,
                format!("loading {} not confirmed: {}", dir.display(), e),
            );
        }
    }

    /// Host resumed: bring the server back if it ended and reload the
    /// definitions into it. Files are not delivered again.
    pub fn restart_if_ended(&self) {
        let _startup = self.startup.lock().unwrap_or_else(|e| e.into_inner());
        if self.backend.is_ended() && self.start_backend() {
            self.load_definitions();
        }
    }

    /// Hand a composed batch to the transport. Failures are reported, not returned.
    pub fn send(&self, messages: Vec<ControlMessage>) {
        if let Err(e) = self.backend.send_batch(messages) {
            log::warn!(target: "timbre::osc", "batch not delivered: {}", e);
            self.diagnose(Severity::Warning, DiagnosticCode::TransportFailed, e.to_string());
        }
    }

    /// Give queued traffic up to `timeout` to reach the server. Hosts call
    /// this before the process exits.
    pub fn flush(&self, timeout: Duration) {
        if let Err(e) = self.backend.flush(timeout) {
            log::warn!(target: "timbre::osc", "{}", e);
            self.diagnose(Severity::Warning, DiagnosticCode::TransportFailed, e.to_string());
        }
    }

    pub fn send_quit(&self) {
        if let Err(e) = self.backend.send_quit() {
            log::warn!(target: "timbre::osc", "quit not delivered: {}", e);
            self.diagnose(Severity::Warning, DiagnosticCode::TransportFailed, e.to_string());
        }
    }
}
