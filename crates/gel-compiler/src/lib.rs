//! Macro expansion for the gel SQL preprocessor.
//!
//! This crate handles:
//! - Discovering `.sql` sources and loading them as line nodes
//! - The expansion state machine and its rewrite rules
//! - Emitting the final statement stream

pub mod builder;
pub mod discovery;
pub mod emitter;
pub mod expander;
pub mod rules;

pub use builder::{BuildOutput, Builder};
pub use discovery::SourceDiscovery;
pub use emitter::emit;
pub use expander::{Expander, ExpanderOptions, ExpansionSummary, PassContext};
