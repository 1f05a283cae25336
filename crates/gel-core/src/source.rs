//! Line-granularity source model.
//!
//! Every line of every source file becomes one [`Node`]. Nodes are created
//! once by the loader and never removed; the expansion pass fills in their
//! emitted text.

use crate::classify::{self, Classification, Classifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a node came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileInfo {
    /// File base name without extension. Becomes the schema name.
    pub namespace: String,
    pub file_name: String,
    pub location: PathBuf,
}

impl FileInfo {
    pub fn new(
        namespace: impl Into<String>,
        file_name: impl Into<String>,
        location: impl Into<PathBuf>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            file_name: file_name.into(),
            location: location.into(),
        }
    }

    /// Derive the namespace and file name from a path.
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let namespace = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            namespace,
            file_name,
            location: path.to_path_buf(),
        }
    }
}

/// One source line.
#[derive(Debug, Clone)]
pub struct Node {
    info: Arc<FileInfo>,
    /// 1-based line number; 0 for the synthetic end-of-stream node.
    position: usize,
    raw: String,
    emitted: String,
}

impl Node {
    pub fn new(info: Arc<FileInfo>, position: usize, raw: impl Into<String>) -> Self {
        Self {
            info,
            position,
            raw: raw.into(),
            emitted: String::new(),
        }
    }

    /// Synthetic empty node appended when a block is still open after the
    /// last real line.
    pub fn end_of_stream() -> Self {
        Self::new(Arc::new(FileInfo::default()), 0, "")
    }

    pub fn namespace(&self) -> &str {
        &self.info.namespace
    }

    pub fn file_name(&self) -> &str {
        &self.info.file_name
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn emitted(&self) -> &str {
        &self.emitted
    }

    pub fn set_emitted(&mut self, text: impl Into<String>) {
        self.emitted = text.into();
    }

    /// Append to whatever has already been emitted for this node.
    pub fn push_emitted(&mut self, text: &str) {
        self.emitted.push_str(text);
    }

    pub fn is_empty(&self) -> bool {
        classify::is_empty(&self.raw)
    }

    pub fn is_whitespace_leading(&self) -> bool {
        classify::is_whitespace_leading(&self.raw)
    }

    pub fn is_newline(&self) -> bool {
        classify::is_newline(&self.raw)
    }

    pub fn classify(&self, classifier: &Classifier) -> Classification {
        classifier.classify(&self.raw)
    }
}

/// All lines of one source file.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub info: FileInfo,
    pub lines: Vec<String>,
}

impl SourceUnit {
    pub fn new(info: FileInfo, lines: Vec<String>) -> Self {
        Self { info, lines }
    }

    /// Build a unit from in-memory text. `name` is the file name, e.g. `math.sql`.
    pub fn from_text(name: &str, text: &str) -> Self {
        let info = FileInfo::from_path(Path::new(name));
        let lines = text.lines().map(str::to_string).collect();
        Self { info, lines }
    }

    pub fn namespace(&self) -> &str {
        &self.info.namespace
    }

    /// Turn the unit into nodes numbered from 1.
    pub fn into_nodes(self) -> Vec<Node> {
        let info = Arc::new(self.info);
        self.lines
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Node::new(Arc::clone(&info), i + 1, raw))
            .collect()
    }
}
