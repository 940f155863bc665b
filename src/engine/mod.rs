//! Engine: route registration, route groups, and request dispatch.
//!
//! Registration happens single-threaded at startup; after that the engine
//! moves behind an `Arc` and `dispatch` runs concurrently from the server
//! glue. Groups are stored flat on the engine. A group participates in a
//! request when its name is a plain string prefix of the request path, in
//! creation order, so `/p` also matches `/prefixed`; the root group (empty
//! name) matches everything.

mod router;
mod static_files;

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use tracing::info;

use crate::core::{BoxHandler, Context, Handler, Response, Result};
use crate::middleware;
use crate::render::{JsonCodec, TemplateEngine};

struct GroupData {
    /// Concatenated prefix chain, e.g. `/api/v1`; empty for the root group.
    name: String,
    middlewares: Vec<BoxHandler>,
}

/// Route registry plus shared per-request configuration.
pub struct Engine {
    router: router::Router,
    groups: Vec<GroupData>,
    codec: JsonCodec,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl Engine {
    /// An engine with no middleware at all.
    pub fn new() -> Self {
        Self {
            router: router::Router::new(),
            groups: vec![GroupData {
                name: String::new(),
                middlewares: Vec::new(),
            }],
            codec: JsonCodec::default(),
            templates: None,
        }
    }

    /// An engine with access logging and panic recovery installed on the
    /// root group, logger outermost so it observes the recovered status.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.use_middleware(middleware::logger());
        engine.use_middleware(middleware::recovery());
        engine
    }

    pub fn set_codec(&mut self, codec: JsonCodec) {
        self.codec = codec;
    }

    pub fn set_templates(&mut self, templates: impl TemplateEngine + 'static) {
        self.templates = Some(Arc::new(templates));
    }

    /// Open a child group of the root group.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            engine: self,
            index: 0,
        }
        .group(prefix)
    }

    /// Install middleware on the root group (runs for every request).
    pub fn use_middleware(&mut self, handler: impl Handler + 'static) {
        self.groups[0].middlewares.push(Arc::new(handler));
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler + 'static) {
        self.add_route(Method::GET, pattern, handler);
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler + 'static) {
        self.add_route(Method::POST, pattern, handler);
    }

    pub fn add_route(&mut self, method: Method, pattern: &str, handler: impl Handler + 'static) {
        self.router.add_route(&method, pattern, Arc::new(handler));
    }

    /// Serve files from `root` under the URL prefix `mount`.
    pub fn static_dir(&mut self, mount: &str, root: impl Into<PathBuf>) {
        register_static(self, mount.to_string(), root.into());
    }

    /// Run the matched chain for one buffered request. Public so applications
    /// can exercise routing in-process without a socket.
    pub fn dispatch(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_string();
        let query = parts.uri.query().map(|s| s.to_string());

        let mut chain: Vec<BoxHandler> = Vec::new();
        for group in &self.groups {
            if path.starts_with(&group.name) {
                chain.extend(group.middlewares.iter().cloned());
            }
        }

        let route = self.router.resolve(&parts.method, &path);
        let mut ctx = Context::new(
            parts.method,
            path,
            query,
            parts.headers,
            body,
            chain,
            self.codec,
            self.templates.clone(),
        );
        match route {
            Some(handler) => ctx.push_handler(handler),
            None => ctx.push_handler(Arc::new(router::not_found)),
        }
        ctx.next();
        ctx.into_response()
    }

    /// Bind `addr` and serve until the task is cancelled.
    pub async fn run(self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        self.serve(listener).await
    }

    /// Serve on an already-bound listener (lets tests bind port 0 first).
    pub async fn serve(self, listener: tokio::net::TcpListener) -> Result<()> {
        crate::server::serve(Arc::new(self), listener).await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable view of one group; created by [`Engine::group`] or
/// [`RouteGroup::group`] and used during startup registration.
pub struct RouteGroup<'e> {
    engine: &'e mut Engine,
    index: usize,
}

impl<'e> RouteGroup<'e> {
    /// Open a nested group; its name is this group's name plus `prefix`.
    pub fn group(self, prefix: &str) -> RouteGroup<'e> {
        let name = format!("{}{}", self.engine.groups[self.index].name, prefix);
        self.engine.groups.push(GroupData {
            name,
            middlewares: Vec::new(),
        });
        RouteGroup {
            index: self.engine.groups.len() - 1,
            engine: self.engine,
        }
    }

    /// Install middleware on this group.
    pub fn use_middleware(&mut self, handler: impl Handler + 'static) {
        self.engine.groups[self.index].middlewares.push(Arc::new(handler));
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler + 'static) {
        self.add_route(Method::GET, pattern, handler);
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler + 'static) {
        self.add_route(Method::POST, pattern, handler);
    }

    /// Register a route at this group's prefix plus `pattern`.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: impl Handler + 'static) {
        let full = format!("{}{}", self.engine.groups[self.index].name, pattern);
        self.engine.router.add_route(&method, &full, Arc::new(handler));
    }

    /// Serve files from `root` under this group's prefix plus `mount`.
    pub fn static_dir(&mut self, mount: &str, root: impl Into<PathBuf>) {
        let mount = format!("{}{}", self.engine.groups[self.index].name, mount);
        register_static(self.engine, mount, root.into());
    }
}

fn register_static(engine: &mut Engine, mount: String, root: PathBuf) {
    let mount = mount.trim_end_matches('/').to_string();
    let pattern = format!("{}/*filepath", mount);
    let handler = static_files::static_handler(mount, root);
    engine.router.add_route(&Method::GET, &pattern, Arc::new(handler));
}
