//! Core request-handling types shared across the crate.

pub mod context;
pub mod cookie;
pub mod error;
pub mod handler;
pub mod response;

pub use context::Context;
pub use cookie::Cookie;
pub use error::{Error, Result};
pub use handler::{BoxHandler, Handler};
pub use response::Response;
