use tracing_subscriber::EnvFilter;

/// Engine-side diagnostic hook. The evaluator never reads environment flags
/// itself; callers that want visibility inject a sink, everyone else gets
/// the no-op.
pub trait DiagnosticSink {
    fn debug(&self, message: &str);
}

/// Default sink: discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn debug(&self, _message: &str) {}
}

/// Forwards engine diagnostics to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "intern_match::engine", "{message}");
    }
}

/// Initialize a stdout tracing subscriber for binaries embedding the engine.
/// Uses `RUST_LOG` for filtering if present. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing_subscriber() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_messages() {
        NoopSink.debug("ignored");
    }

    #[test]
    fn tracing_sink_forwards_without_a_subscriber() {
        // No subscriber installed; the call must still be a no-op, not a panic.
        TracingSink.debug("listing excluded");
    }
}
