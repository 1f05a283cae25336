//! Expansion trace subscribers for the gel SQL preprocessor.
//!
//! The expander reports each rewrite it performs through the
//! [`gel_core::Subscriber`] trait. This crate provides the implementations
//! the CLI and tests plug in.

pub mod subscriber;

pub use subscriber::{CollectingSubscriber, ConsoleSubscriber, JsonSubscriber};
