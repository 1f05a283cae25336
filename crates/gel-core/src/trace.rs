//! Expansion trace types.
//!
//! The expansion pass reports every rewrite it performs to a [`Subscriber`].
//! The trace is a diagnostic side channel; it never affects the output.

use crate::block::BlockState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The rewrite rule applied to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Drop/create schema pair injected at a namespace change.
    SchemaHeader,
    /// Blank line, nothing emitted.
    SkipEmpty,
    /// Top-level line closed the open block.
    CloseBlock,
    OpenBlock,
    ExecMacro,
    QueryMacro,
    /// `this.` / `getv(` rewrite on continuation lines.
    ScopeMacro,
    /// Raw line plus a `-- <namespace>:<line>` comment.
    Default,
    /// Forced closure after the last real line.
    EndOfStream,
    /// A bare newline that no rule touched.
    Passthrough,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::SchemaHeader => "schema header",
            Rule::SkipEmpty => ".",
            Rule::CloseBlock => "close block",
            Rule::OpenBlock => "open block",
            Rule::ExecMacro => "exec! macro",
            Rule::QueryMacro => "|> macro",
            Rule::ScopeMacro => "scope macro",
            Rule::Default => "default macro",
            Rule::EndOfStream => "EOF",
            Rule::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub namespace: String,
    /// Line position of the node, 0 for the end-of-stream node.
    pub position: usize,
    pub rule: Rule,
    /// Block state after the rule was applied.
    pub state: BlockState,
    /// Text the rule produced for the node.
    pub emitted: String,
}

/// A trait for receiving expansion trace events.
pub trait Subscriber: Send + Sync {
    fn on_trace(&self, event: TraceEvent);

    fn on_complete(&self);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSubscriber;

impl Subscriber for NoopSubscriber {
    fn on_trace(&self, _event: TraceEvent) {}

    fn on_complete(&self) {}
}
