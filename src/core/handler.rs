//! Handler abstraction for routes and middleware.

use std::sync::Arc;

use super::Context;

/// A unit of work over a request context.
///
/// Routes and middleware share this trait; a middleware is simply a handler
/// that calls [`Context::next`] to run the remainder of the chain, optionally
/// doing work before and after. Any `Fn(&mut Context)` closure qualifies.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn handle(&self, ctx: &mut Context) {
        self(ctx)
    }
}

/// Shared handler reference stored in the route table and group lists.
pub type BoxHandler = Arc<dyn Handler>;
