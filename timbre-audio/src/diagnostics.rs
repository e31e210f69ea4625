//! Diagnostic sinks.

use std::sync::{Arc, Mutex, MutexGuard};

use timbre_types::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};

/// Forwards diagnostics to the `log` facade.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, d: Diagnostic) {
        let level = match d.severity {
            Severity::Debug => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Notice | Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        };
        log::log!(target: "timbre::diag", level, "{:?}: {}", d.code, d.context);
    }
}

/// Collects diagnostics in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn records(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn codes(&self) -> Vec<DiagnosticCode> {
        self.lock().iter().map(|d| d.code).collect()
    }

    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.lock().iter().any(|d| d.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, d: Diagnostic) {
        self.lock().push(d);
    }
}

/// Sends every diagnostic to each inner sink.
pub struct FanoutSink(pub Vec<Arc<dyn DiagnosticSink>>);

impl DiagnosticSink for FanoutSink {
    fn emit(&self, d: Diagnostic) {
        for sink in &self.0 {
            sink.emit(d.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_reaches_every_sink() {
        let a = Arc::new(MemorySink::new());
        let b = Arc::new(MemorySink::new());
        let sinks: Vec<Arc<dyn DiagnosticSink>> = vec![a.clone(), b.clone(), Arc::new(LogSink)];
        let fanout = FanoutSink(sinks);
        fanout.emit(Diagnostic::new(
            Severity::Notice,
            DiagnosticCode::InvalidSource,
            "organ",
        ));
        assert_eq!(a.codes(), vec![DiagnosticCode::InvalidSource]);
        assert_eq!(b.records()[0].context, "organ");
    }

    #[test]
    fn memory_sink_clears() {
        let sink = MemorySink::new();
        sink.emit(Diagnostic::new(Severity::Info, DiagnosticCode::ValueClamped, "x"));
        assert!(sink.contains(DiagnosticCode::ValueClamped));
        sink.clear();
        assert!(sink.is_empty());
    }
}
