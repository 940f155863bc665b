//! Built-in middleware: access logging and panic recovery.

mod access_log;
mod recovery;

pub use access_log::logger;
pub use recovery::recovery;
