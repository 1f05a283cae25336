//! `psql` pipe backend.
//!
//! Runs the interactive PostgreSQL client as a subprocess, feeds the stream
//! on its standard input followed by a quit directive, and forwards its
//! standard output and error to the caller's.

use crate::backend::{Backend, ExecutionReport};
use gel_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info, warn};

/// Meta-command ending the client session.
pub const QUIT_DIRECTIVE: &str = "\\q\n";

/// How the client is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsqlConfig {
    /// Client executable.
    pub program: String,
    /// Database passed with `-d`; omitted when `None`.
    pub database: Option<String>,
    /// Pass `-v ON_ERROR_STOP=1` so the first failing statement aborts.
    pub on_error_stop: bool,
    /// Appended after the generated arguments.
    pub extra_args: Vec<String>,
}

impl Default for PsqlConfig {
    fn default() -> Self {
        Self {
            program: "psql".to_string(),
            database: Some("ensure".to_string()),
            on_error_stop: true,
            extra_args: Vec::new(),
        }
    }
}

impl PsqlConfig {
    /// Command-line arguments for the client.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.on_error_stop {
            args.extend(["-v".to_string(), "ON_ERROR_STOP=1".to_string()]);
        }
        if let Some(database) = &self.database {
            args.extend(["-d".to_string(), database.clone()]);
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Pipes the stream into `psql`.
#[derive(Debug, Clone, Default)]
pub struct PsqlBackend {
    config: PsqlConfig,
}

impl PsqlBackend {
    pub fn new(config: PsqlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PsqlConfig {
        &self.config
    }

    /// Run the client, forwarding its output streams to `out` and `err`.
    pub fn execute_with<O, E>(&self, sql: &str, out: O, err: E) -> Result<ExecutionReport>
    where
        O: Write + Send,
        E: Write + Send,
    {
        let args = self.config.args();
        debug!(program = %self.config.program, ?args, "starting client");

        let mut child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Execution(format!("Failed to start {}: {}", self.config.program, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Execution("client stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Execution("client stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Execution("client stderr not captured".into()))?;

        thread::scope(|s| {
            s.spawn(move || forward(stdout, out));
            s.spawn(move || forward(stderr, err));
            s.spawn(move || write_script(stdin, sql));
        });

        let status = child.wait().map_err(|e| {
            Error::Execution(format!("Failed to wait for {}: {}", self.config.program, e))
        })?;

        if !status.success() {
            return Err(Error::Execution(format!(
                "{} exited with {}",
                self.config.program, status
            )));
        }

        info!(program = %self.config.program, bytes = sql.len(), "client finished");
        Ok(ExecutionReport::new(self.name(), sql.len()).with_exit_code(status.code()))
    }
}

impl Backend for PsqlBackend {
    fn name(&self) -> &'static str {
        "psql"
    }

    fn execute(&self, sql: &str) -> Result<ExecutionReport> {
        self.execute_with(sql, io::stdout(), io::stderr())
    }
}

/// Feed the stream and the quit directive, then close stdin.
fn write_script(mut stdin: impl Write, sql: &str) {
    let result = stdin
        .write_all(sql.as_bytes())
        .and_then(|_| stdin.write_all(QUIT_DIRECTIVE.as_bytes()))
        .and_then(|_| stdin.flush());

    // The client may exit before reading everything; its exit status decides.
    if let Err(e) = result {
        warn!(error = %e, "client stopped reading input");
    }
}

fn forward(mut from: impl Read, mut to: impl Write) {
    if let Err(e) = io::copy(&mut from, &mut to) {
        warn!(error = %e, "failed to forward client output");
    }
    let _ = to.flush();
}
