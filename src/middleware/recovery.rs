//! Panic recovery middleware.

use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe};

use http::StatusCode;
use tracing::error;

use crate::core::{Context, Handler};

/// Catch a panic anywhere in the rest of the chain, log it with a captured
/// backtrace, and answer 500 instead of tearing down the worker. Handlers
/// that already wrote a body before panicking keep that response.
pub fn recovery() -> impl Handler {
    |ctx: &mut Context| {
        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.next()));
        if let Err(panic) = outcome {
            let backtrace = Backtrace::force_capture();
            error!(
                method = %ctx.method(),
                path = %ctx.path(),
                panic = panic_message(panic.as_ref()),
                %backtrace,
                "handler panicked"
            );
            ctx.error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
