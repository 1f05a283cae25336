//! Core types for the gel SQL preprocessor.
//!
//! This crate defines the marker vocabulary, block states, the line
//! classifier and the line-granularity source model shared by the rest of
//! the workspace. It holds no expansion logic.

pub mod block;
pub mod classify;
pub mod error;
pub mod source;
pub mod token;
pub mod trace;

pub use block::BlockState;
pub use classify::{Classification, Classifier, MatchMode};
pub use error::{Error, Result};
pub use source::{FileInfo, Node, SourceUnit};
pub use token::Token;
pub use trace::{NoopSubscriber, Rule, Subscriber, TraceEvent};
