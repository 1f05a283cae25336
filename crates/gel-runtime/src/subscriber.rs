mod collect;
mod console;
mod json;

pub use collect::CollectingSubscriber;
pub use console::ConsoleSubscriber;
pub use json::JsonSubscriber;

pub use gel_core::{NoopSubscriber, Subscriber};
