//! Audio backend trait: the transport between the note pipeline and the
//! synthesis server.
//!
//! `AudioBackend` captures what the session means to do (deliver an ordered
//! batch, shut the server down, bring it back up) independently of how it is
//! done (OSC over UDP to SuperCollider). This lets the session and composer
//! be tested without a running server.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rosc::OscType;
use timbre_types::message::{build_quit_message, build_status_message, build_sync_message};
use timbre_types::ControlMessage;

use super::server::ScServer;
use crate::osc_client::OscClient;

/// Result type for backend operations.
pub type BackendResult<T = ()> = Result<T, BackendError>;

/// Error from a backend operation.
#[derive(Debug, Clone)]
pub struct BackendError(pub String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError(e.to_string())
    }
}

impl From<String> for BackendError {
    fn from(s: String) -> Self {
        BackendError(s)
    }
}

/// Semantic-level backend trait. Shared by every session in the process.
pub trait AudioBackend: Send + Sync {
    /// Deliver `messages` in order. Fire-and-forget: no acknowledgement.
    fn send_batch(&self, messages: Vec<ControlMessage>) -> BackendResult;

    /// Ask the server to exit. Safe to call when it already has.
    fn send_quit(&self) -> BackendResult;

    /// Whether the server has stopped (or was never started).
    fn is_ended(&self) -> bool;

    /// Start (or restart) the server.
    fn start(&self) -> BackendResult;

    /// Wait up to `timeout` for sends still in flight. Backends that send
    /// synchronously have nothing to wait for.
    fn flush(&self, _timeout: Duration) -> BackendResult {
        Ok(())
    }

    /// Wait up to `timeout` until the server has finished every command sent
    /// so far, including asynchronous ones such as definition loads.
    fn sync(&self, _timeout: Duration) -> BackendResult {
        Ok(())
    }
}

// ─── SuperCollider Backend ──────────────────────────────────────────

/// Backend that talks OSC to a SuperCollider server, optionally managing
/// the `scsynth` process itself.
pub struct ScBackend {
    client: OscClient,
    server: ScServer,
    next_sync_id: AtomicI32,
}

/// How long a freshly spawned `scsynth` gets to start answering.
const BOOT_TIMEOUT: Duration = Duration::from_secs(5);
const BOOT_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl ScBackend {
    pub fn new(client: OscClient, server: ScServer) -> Self {
        Self {
            client,
            server,
            next_sync_id: AtomicI32::new(1),
        }
    }

    /// Poll `/status` until the server answers. UDP sent before the server
    /// binds its port is lost, so nothing else may be sent until this returns.
    pub fn wait_ready(&self, timeout: Duration) -> BackendResult {
        self.client
            .request(build_status_message(), timeout, BOOT_POLL_INTERVAL, |reply| {
                reply.addr == "/status.reply"
            })
            .map_err(|e| BackendError(format!("server did not come up: {}", e)))?;
        log::info!(target: "timbre::server", "server at {} is answering", self.client.server_addr());
        Ok(())
    }
}

impl AudioBackend for ScBackend {
    fn send_batch(&self, messages: Vec<ControlMessage>) -> BackendResult {
        self.client.send_batch(messages).map_err(BackendError::from)
    }

    fn send_quit(&self) -> BackendResult {
        self.server.mark_quit();
        self.client
            .send_batch(vec![build_quit_message()])
            .map_err(BackendError::from)
    }

    fn is_ended(&self) -> bool {
        self.server.is_ended()
    }

    fn start(&self) -> BackendResult {
        self.server.start().map_err(BackendError::from)?;
        if self.server.spawns() {
            self.wait_ready(BOOT_TIMEOUT)?;
        }
        Ok(())
    }

    fn sync(&self, timeout: Duration) -> BackendResult {
        let id = self.next_sync_id.fetch_add(1, Ordering::Relaxed);
        self.client
            .request(build_sync_message(id), timeout, timeout, |reply| {
                reply.addr == "/synced" && reply.args.first() == Some(&OscType::Int(id))
            })
            .map(|_| ())
            .map_err(BackendError::from)
    }

    fn flush(&self, timeout: Duration) -> BackendResult {
        if self.client.wait_idle(timeout) {
            Ok(())
        } else {
            Err(BackendError(format!(
                "OSC queue to {} not drained after {:?}",
                self.client.server_addr(),
                timeout
            )))
        }
    }
}

// ─── Test Backend ───────────────────────────────────────────────────

/// An operation recorded by `TestBackend` for assertion in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum TestOp {
    Batch(Vec<ControlMessage>),
    Quit,
    Start,
    Sync,
}

/// A backend that records all operations into a vector for assertions.
///
/// Starts out "ended" unless built with [`TestBackend::running`], so the first
/// session exercises the startup path. Also used by `--dry-run`.
pub struct TestBackend {
    ops: Mutex<Vec<TestOp>>,
    ended: AtomicBool,
    fail_sends: AtomicBool,
}

impl TestBackend {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            ended: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// A backend whose server is already up.
    pub fn running() -> Self {
        let backend = Self::new();
        backend.ended.store(false, Ordering::SeqCst);
        backend
    }

    /// Make subsequent `send_batch` calls fail (still recording nothing).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Simulate the server dying on its own.
    pub fn set_ended(&self, ended: bool) {
        self.ended.store(ended, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TestOp>> {
        self.ops.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return all recorded operations.
    pub fn operations(&self) -> Vec<TestOp> {
        self.lock().clone()
    }

    /// Clear recorded operations.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Count operations matching a predicate.
    pub fn count<F: Fn(&TestOp) -> bool>(&self, f: F) -> usize {
        self.lock().iter().filter(|op| f(op)).count()
    }

    /// Every batch sent, in order.
    pub fn batches(&self) -> Vec<Vec<ControlMessage>> {
        self.lock()
            .iter()
            .filter_map(|op| match op {
                TestOp::Batch(messages) => Some(messages.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every message sent, flattened across batches.
    pub fn messages(&self) -> Vec<ControlMessage> {
        self.batches().into_iter().flatten().collect()
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for TestBackend {
    fn send_batch(&self, messages: Vec<ControlMessage>) -> BackendResult {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BackendError("send failed".to_string()));
        }
        self.lock().push(TestOp::Batch(messages));
        Ok(())
    }

    fn send_quit(&self) -> BackendResult {
        self.lock().push(TestOp::Quit);
        self.ended.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn start(&self) -> BackendResult {
        self.lock().push(TestOp::Start);
        self.ended.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn sync(&self, _timeout: Duration) -> BackendResult {
        self.lock().push(TestOp::Sync);
        Ok(())
    }
}
