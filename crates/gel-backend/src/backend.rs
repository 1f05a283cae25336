//! Backend trait definitions.

use gel_core::Result;
use serde::Serialize;

/// Outcome of handing a statement stream to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Name of the backend that ran.
    pub backend: &'static str,
    /// Bytes of SQL handed over, not counting any quit directive.
    pub bytes: usize,
    /// Exit code of the external process, if one was run.
    pub exit_code: Option<i32>,
}

impl ExecutionReport {
    pub fn new(backend: &'static str, bytes: usize) -> Self {
        Self {
            backend,
            bytes,
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }
}

/// Something that consumes an emitted statement stream.
pub trait Backend: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Hand over the full stream.
    fn execute(&self, sql: &str) -> Result<ExecutionReport>;
}
