//! Fault reporting.

use crate::error::DriverError;

/// Receives faults the driver cannot handle locally.
pub trait FaultHandler: Send + Sync {
    fn handle_fault(&self, message: &str, cause: &DriverError);
}

/// Reports faults at error level and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFaultHandler;

impl FaultHandler for LoggingFaultHandler {
    fn handle_fault(&self, message: &str, cause: &DriverError) {
        tracing::error!(%cause, "{message}");
    }
}
