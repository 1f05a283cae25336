use crate::backend::{Backend, ExecutionReport};
use gel_core::Result;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

/// Writes the stream to a file, creating parent directories.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Backend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn execute(&self, sql: &str) -> Result<ExecutionReport> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, sql)?;
        info!(path = %self.path.display(), bytes = sql.len(), "wrote expanded sql");
        Ok(ExecutionReport::new(self.name(), sql.len()))
    }
}

/// Writes the stream to any writer, e.g. stdout.
pub struct WriterBackend<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterBackend<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Backend for WriterBackend<W> {
    fn name(&self) -> &'static str {
        "writer"
    }

    fn execute(&self, sql: &str) -> Result<ExecutionReport> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| gel_core::Error::Other("writer lock poisoned".into()))?;
        writer.write_all(sql.as_bytes())?;
        writer.flush()?;
        Ok(ExecutionReport::new(self.name(), sql.len()))
    }
}
