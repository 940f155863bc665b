//! Exact-match route table.
//!
//! Routes are keyed by `"METHOD-pattern"` and looked up with the literal
//! request path; there is no segment splitting or wildcard expansion here.
//! Re-registering a key silently replaces the previous handler.

use std::collections::HashMap;

use http::{Method, StatusCode};

use crate::core::{BoxHandler, Context};

pub(crate) struct Router {
    table: HashMap<String, BoxHandler>,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub(crate) fn add_route(&mut self, method: &Method, pattern: &str, handler: BoxHandler) {
        self.table.insert(route_key(method, pattern), handler);
    }

    /// Handler for an exact method + path match, if one is registered.
    pub(crate) fn resolve(&self, method: &Method, path: &str) -> Option<BoxHandler> {
        self.table.get(&route_key(method, path)).cloned()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }
}

fn route_key(method: &Method, pattern: &str) -> String {
    format!("{}-{}", method, pattern)
}

/// Terminal handler appended when no route matches.
pub(crate) fn not_found(ctx: &mut Context) {
    let body = format!("404 NOT FOUND: {}\n", ctx.path());
    ctx.string(StatusCode::NOT_FOUND, body);
}
