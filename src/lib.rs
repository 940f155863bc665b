//! pylon: a small HTTP request-dispatch library.
//!
//! An [`Engine`] holds an exact-match route table and a flat list of route
//! groups. Each inbound request gets a fresh [`Context`] carrying the
//! ordered handler chain (group middleware in creation order, then the
//! matched route or the not-found handler); handlers drive the rest of the
//! chain with [`Context::next`] and write a buffered response through the
//! context's output helpers.
//!
//! ```no_run
//! use http::StatusCode;
//! use pylon::{Context, Engine};
//!
//! #[tokio::main]
//! async fn main() -> pylon::Result<()> {
//!     pylon::logging::init("info,access=info");
//!
//!     let mut engine = Engine::with_defaults();
//!     engine.get("/ping", |ctx: &mut Context| {
//!         ctx.string(StatusCode::OK, "pong")
//!     });
//!
//!     let mut api = engine.group("/api");
//!     api.get("/time", |ctx: &mut Context| {
//!         ctx.json(StatusCode::OK, &serde_json::json!({ "epoch_ms": 0 }));
//!     });
//!
//!     engine.run("127.0.0.1:8080").await
//! }
//! ```

pub mod bind;
pub mod core;
pub mod engine;
pub mod logging;
pub mod middleware;
pub mod render;

mod server;

pub use crate::core::{BoxHandler, Context, Cookie, Error, Handler, Response, Result};
pub use crate::engine::{Engine, RouteGroup};
pub use bind::{FieldKind, FieldSpec, Schema, Validate};
pub use render::{JsonCodec, PlaceholderTemplates, TemplateEngine};

/// Crate version, for banners and diagnostics.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
