//! Execution backends for expanded gel SQL.
//!
//! A backend takes the emitted statement stream and does something with it:
//! pipe it into `psql`, write it to a file, or print it.

pub mod backend;
pub mod file;
pub mod psql;

pub use backend::{Backend, ExecutionReport};
pub use file::{FileBackend, WriterBackend};
pub use psql::{PsqlBackend, PsqlConfig};
