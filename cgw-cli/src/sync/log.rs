//! Logging port used by the reconciliation engine

use std::error::Error;

const TARGET: &str = "cgw::sync";

/// Sink for engine progress messages.
///
/// Handlers and the ledger protocol log through this port instead of the
/// global logger so callers decide where batch output goes.
pub trait SyncLog: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    /// Report a failure together with the error that caused it
    fn exception(&self, message: &str, error: &dyn Error);
}

/// Forwards to the `log` facade under the `cgw::sync` target
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl SyncLog for LogFacade {
    fn debug(&self, message: &str) {
        log::debug!(target: TARGET, "{}", message);
    }

    fn info(&self, message: &str) {
        log::info!(target: TARGET, "{}", message);
    }

    fn warning(&self, message: &str) {
        log::warn!(target: TARGET, "{}", message);
    }

    fn exception(&self, message: &str, error: &dyn Error) {
        log::error!(target: TARGET, "{}: {}", message, error);
        let mut source = error.source();
        while let Some(cause) = source {
            log::error!(target: TARGET, "  caused by: {}", cause);
            source = cause.source();
        }
    }
}
