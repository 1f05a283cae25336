//! Source discovery.
//!
//! Walks a directory tree for annotated SQL files and loads each one as a
//! [`SourceUnit`]. Files are visited in lexical order so the node sequence,
//! and therefore the emitted stream, is deterministic.

use gel_core::{Error, FileInfo, Node, Result, SourceUnit};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Default source file extension, without the dot.
pub const SQL_EXTENSION: &str = "sql";

/// Discovers source units by scanning a directory tree.
pub struct SourceDiscovery {
    /// Root directory (or single file) to scan.
    root: PathBuf,
    extension: String,
}

impl SourceDiscovery {
    /// Create a discovery instance for the given root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: SQL_EXTENSION.to_string(),
        }
    }

    /// Only pick up files with this extension (without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover and load every matching file under the root.
    ///
    /// Any file that cannot be read aborts discovery.
    pub fn discover(&self) -> Result<Vec<SourceUnit>> {
        if !self.root.exists() {
            return Err(Error::Other(format!(
                "Source directory not found: {}",
                self.root.display()
            )));
        }

        let mut units = Vec::new();
        for path in self.find_source_files()? {
            units.push(self.load_file(&path)?);
        }

        info!(
            root = %self.root.display(),
            files = units.len(),
            "discovered sources"
        );
        Ok(units)
    }

    /// Discover and flatten every unit into one ordered node sequence.
    pub fn discover_nodes(&self) -> Result<Vec<Node>> {
        Ok(self
            .discover()?
            .into_iter()
            .flat_map(SourceUnit::into_nodes)
            .collect())
    }

    fn find_source_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Load {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone()),
                source: e.into(),
            })?;

            if entry.file_type().is_file() && self.matches_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext == self.extension.as_str())
            .unwrap_or(false)
    }

    /// Load a single file as a unit, one line per entry.
    fn load_file(&self, path: &Path) -> Result<SourceUnit> {
        let content = fs::read_to_string(path).map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let info = FileInfo::from_path(path);
        debug!(namespace = %info.namespace, path = %path.display(), "loaded source");

        let lines = content.lines().map(str::to_string).collect();
        Ok(SourceUnit::new(info, lines))
    }
}
