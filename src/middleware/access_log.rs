//! Access logging middleware.

use tracing::info;

use crate::core::{Context, Handler};

/// Log one line per request after the rest of the chain has run, so the
/// status and timing reflect whatever the chain (including recovery)
/// ultimately wrote. Lines go to the `access` target for separate filtering.
pub fn logger() -> impl Handler {
    |ctx: &mut Context| {
        ctx.next();
        info!(
            target: "access",
            method = %ctx.method(),
            path = %ctx.path(),
            status = ctx.response_status().as_u16(),
            duration_ms = ctx.elapsed_ms(),
            "request"
        );
    }
}
