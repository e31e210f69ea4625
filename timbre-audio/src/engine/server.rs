use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

const SCSYNTH_PATHS: [&str; 4] = [
    "scsynth",
    "/Applications/SuperCollider.app/Contents/Resources/scsynth",
    "/usr/local/bin/scsynth",
    "/usr/bin/scsynth",
];

/// Spawn scsynth listening on `port`, trying the usual install locations.
/// Server output goes to a log file for crash diagnostics.
fn spawn_scsynth(port: u16) -> Result<Child, String> {
    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
        .join("scsynth.log");
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let log_file = fs::File::create(&log_path).ok();

    let port = port.to_string();
    for path in &SCSYNTH_PATHS {
        let stdout = log_file
            .as_ref()
            .and_then(|f| f.try_clone().ok())
            .map(Stdio::from)
            .unwrap_or_else(Stdio::null);
        let stderr = log_file
            .as_ref()
            .and_then(|f| f.try_clone().ok())
            .map(Stdio::from)
            .unwrap_or_else(Stdio::null);
        match Command::new(path)
            .args(["-u", &port])
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
        {
            Ok(child) => {
                log::info!(target: "timbre::server", "started {} on UDP port {}", path, port);
                return Ok(child);
            }
            Err(_) => continue,
        }
    }

    Err("Could not find scsynth. Install SuperCollider.".to_string())
}

/// Lifecycle of the SuperCollider server process.
///
/// With `spawn` set the server is a child process and "ended" means the child
/// has exited or was told to quit. Without it the server is managed
/// elsewhere and only a sent quit marks it ended.
pub struct ScServer {
    spawn: bool,
    port: u16,
    child: Mutex<Option<Child>>,
    quit_sent: AtomicBool,
}

impl ScServer {
    pub fn new(spawn: bool, port: u16) -> Self {
        Self {
            spawn,
            port,
            child: Mutex::new(None),
            quit_sent: AtomicBool::new(false),
        }
    }

    /// An externally managed server that is assumed to be up.
    pub fn external() -> Self {
        Self::new(false, 0)
    }

    fn child(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether this server is a child process started by `start`.
    pub fn spawns(&self) -> bool {
        self.spawn
    }

    pub fn is_ended(&self) -> bool {
        if self.quit_sent.load(Ordering::SeqCst) {
            return true;
        }
        if !self.spawn {
            return false;
        }
        let mut child = self.child();
        match child.as_mut().map(|c| c.try_wait()) {
            Some(Ok(None)) => false,
            Some(Ok(Some(status))) => {
                log::warn!(target: "timbre::server", "scsynth exited ({})", status);
                *child = None;
                true
            }
            Some(Err(_)) | None => true,
        }
    }

    pub fn mark_quit(&self) {
        self.quit_sent.store(true, Ordering::SeqCst);
    }

    pub fn start(&self) -> Result<(), String> {
        if self.spawn {
            let mut child = self.child();
            if let Some(mut old) = child.take() {
                // A quit may still be in flight; the port must be free before relaunching.
                let _ = old.kill();
                let _ = old.wait();
            }
            *child = Some(spawn_scsynth(self.port)?);
        } else {
            log::debug!(target: "timbre::server", "server is externally managed; assuming it is up");
        }
        self.quit_sent.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_server_ends_only_on_quit() {
        let server = ScServer::external();
        assert!(!server.is_ended());
        server.mark_quit();
        assert!(server.is_ended());
        server.start().unwrap();
        assert!(!server.is_ended());
    }

    #[test]
    fn spawned_server_without_child_is_ended() {
        let server = ScServer::new(true, 57110);
        assert!(server.is_ended());
    }
}
