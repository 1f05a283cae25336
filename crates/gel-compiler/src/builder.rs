use crate::discovery::{SourceDiscovery, SQL_EXTENSION};
use crate::emitter::emit;
use crate::expander::{Expander, ExpanderOptions, ExpansionSummary};
use gel_core::{NoopSubscriber, Result, Subscriber};
use std::path::PathBuf;
use tracing::info;

/// Orchestrates discovery, expansion and emission for a source tree.
pub struct Builder {
    source_root: PathBuf,
    extension: String,
    options: ExpanderOptions,
    subscriber: Box<dyn Subscriber>,
}

impl Builder {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            extension: SQL_EXTENSION.to_string(),
            options: ExpanderOptions::default(),
            subscriber: Box::new(NoopSubscriber),
        }
    }

    pub fn with_options(mut self, options: ExpanderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_subscriber(mut self, subscriber: Box<dyn Subscriber>) -> Self {
        self.subscriber = subscriber;
        self
    }

    /// Load every source under the root and expand it into one stream.
    pub fn build(self) -> Result<BuildOutput> {
        let discovery = SourceDiscovery::new(&self.source_root).with_extension(self.extension);
        let units = discovery.discover()?;

        let files = units.iter().map(|u| u.info.location.clone()).collect();
        let mut nodes: Vec<_> = units.into_iter().flat_map(|u| u.into_nodes()).collect();

        let summary = Expander::new(self.options)
            .with_subscriber(self.subscriber)
            .expand(&mut nodes);
        let sql = emit(&nodes);

        info!(
            nodes = summary.nodes,
            namespaces = summary.namespaces.len(),
            blocks = summary.blocks_opened,
            forced_close = summary.forced_close,
            "expansion complete"
        );

        Ok(BuildOutput {
            sql,
            summary,
            files,
        })
    }
}

/// The emitted stream and what went into it.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub sql: String,
    pub summary: ExpansionSummary,
    /// Source files in the order they were expanded.
    pub files: Vec<PathBuf>,
}
