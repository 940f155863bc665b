//! Per-request context: input accessors, buffered output, chain execution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::bind::{self, Schema, Validate};
use crate::render::{self, JsonCodec, TemplateEngine};

use super::cookie::Cookie;
use super::handler::BoxHandler;
use super::{Response, Result};

/// Per-request state threaded through the handler chain.
///
/// A context is created fresh for each inbound request and destroyed when the
/// request completes. It owns an immutable snapshot of the request, the
/// ordered handler chain assembled by the dispatcher, a cursor into that
/// chain, and the buffered response being written.
pub struct Context {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    params: HashMap<String, String>,

    /// Full body snapshot; `body()` exposes it through a one-shot read.
    raw_body: Bytes,
    body_taken: bool,

    chain: Vec<BoxHandler>,
    /// Chain cursor; -1 means execution has not started.
    index: isize,

    response: Response,
    status_written: bool,
    body_written: bool,

    started_at: Instant,
    codec: JsonCodec,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl Context {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        method: Method,
        path: String,
        query: Option<String>,
        headers: HeaderMap,
        body: Bytes,
        chain: Vec<BoxHandler>,
        codec: JsonCodec,
        templates: Option<Arc<dyn TemplateEngine>>,
    ) -> Self {
        Self {
            method,
            path,
            query,
            headers,
            params: HashMap::new(),
            raw_body: body,
            body_taken: false,
            chain,
            index: -1,
            response: Response::default(),
            status_written: false,
            body_written: false,
            started_at: Instant::now(),
            codec,
            templates,
        }
    }

    // ------------------------------------------------------------------
    // Chain execution
    // ------------------------------------------------------------------

    /// Run the remainder of the chain.
    ///
    /// Advances the cursor and invokes the next handler, which may itself
    /// call `next()` to drive everything after it before resuming its own
    /// trailing logic. A handler that never calls `next()` short-circuits
    /// every handler after it; that is the middleware's choice, not an error.
    pub fn next(&mut self) {
        self.index += 1;
        let idx = self.index as usize;
        if let Some(handler) = self.chain.get(idx).cloned() {
            handler.handle(self);
        }
    }

    /// Append a handler to the chain (dispatcher use: the resolved route or
    /// the not-found handler goes last).
    pub(crate) fn push_handler(&mut self, handler: BoxHandler) {
        self.chain.push(handler);
    }

    // ------------------------------------------------------------------
    // Input accessors (side-effect-free except the one-shot body read)
    // ------------------------------------------------------------------

    /// Request method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, if any.
    #[inline]
    pub fn query_str(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Request headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a request header value by name.
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Route parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    /// Record a route parameter (handler-side extraction; the route table
    /// itself never fills these).
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// First value for `key` in the query string, percent-decoded.
    pub fn query(&self, key: &str) -> Option<String> {
        let pairs = bind::parse_pairs(self.query.as_deref()?, false);
        pairs.get(key).cloned()
    }

    /// First value for `key` in the urlencoded request body, percent-decoded.
    ///
    /// Reads an internal snapshot; does not consume the one-shot `body()`.
    pub fn post_form(&self, key: &str) -> Option<String> {
        let body = String::from_utf8_lossy(&self.raw_body);
        let pairs = bind::parse_pairs(&body, false);
        pairs.get(key).cloned()
    }

    /// Raw body bytes. One-shot: the first call drains the stream, later
    /// calls return empty, mirroring a non-rewindable transport body.
    pub fn body(&mut self) -> Bytes {
        if self.body_taken {
            return Bytes::new();
        }
        self.body_taken = true;
        self.raw_body.clone()
    }

    /// Elapsed time since the context was created, in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64() * 1000.0
    }

    // ------------------------------------------------------------------
    // Output primitives
    // ------------------------------------------------------------------

    /// Current response status (final value once the chain has run, which is
    /// what a wrapping logger observes).
    #[inline]
    pub fn response_status(&self) -> StatusCode {
        self.response.status()
    }

    /// Set the response status. Writing the status twice is a caller
    /// contract violation; the second write is dropped and logged.
    pub fn status(&mut self, code: StatusCode) {
        if self.status_written {
            warn!(
                current = %self.response.status(),
                attempted = %code,
                "response status already written; dropping"
            );
            return;
        }
        self.status_written = true;
        self.response.set_status(code);
    }

    /// Set a response header. Invalid names/values are dropped.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.response.headers_mut().insert(name, value);
            }
            _ => debug!(name, "dropping invalid response header"),
        }
    }

    /// Append a `Set-Cookie` header; multiple cookies may be set.
    pub fn set_cookie(&mut self, cookie: &Cookie) {
        if let Ok(value) = HeaderValue::try_from(cookie.to_string()) {
            self.response
                .headers_mut()
                .append(http::header::SET_COOKIE, value);
        }
    }

    /// Write a plain-text body.
    pub fn string(&mut self, code: StatusCode, body: impl Into<String>) {
        if self.check_double_write() {
            return;
        }
        self.set_header("Content-Type", render::CONTENT_TYPE_TEXT);
        self.status(code);
        self.write_body(Bytes::from(body.into()));
    }

    /// Write raw bytes without touching Content-Type.
    pub fn data(&mut self, code: StatusCode, body: impl Into<Bytes>) {
        if self.check_double_write() {
            return;
        }
        self.status(code);
        self.write_body(body.into());
    }

    /// Write an HTML body.
    pub fn html(&mut self, code: StatusCode, body: impl Into<String>) {
        if self.check_double_write() {
            return;
        }
        self.set_header("Content-Type", render::CONTENT_TYPE_HTML);
        self.status(code);
        self.write_body(Bytes::from(body.into()));
    }

    /// Serialize `value` as JSON and write it. An encode failure becomes a
    /// 500 error response and is logged; use [`Context::render_json`] to
    /// handle the error yourself.
    pub fn json<T: Serialize>(&mut self, code: StatusCode, value: &T) {
        if let Err(err) = self.render_json(code, value) {
            error!(%err, "JSON encode failed");
            self.error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
        }
    }

    /// Serialize `value` as JSON and write it, returning the encode error.
    pub fn render_json<T: Serialize>(&mut self, code: StatusCode, value: &T) -> Result<()> {
        let encoded = self.codec.encode(value)?;
        if self.check_double_write() {
            return Ok(());
        }
        self.set_header("Content-Type", render::CONTENT_TYPE_JSON);
        self.status(code);
        self.write_body(Bytes::from(encoded));
        Ok(())
    }

    /// Render a named template through the engine-configured template
    /// collaborator and write it as HTML. A missing engine or a render
    /// failure becomes a 500 error response, mirroring the HTML helper's
    /// self-reporting behavior.
    pub fn render_html(&mut self, code: StatusCode, name: &str, data: &serde_json::Value) {
        let Some(templates) = self.templates.clone() else {
            self.error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "no template engine configured",
            );
            return;
        };
        match templates.render(name, data) {
            Ok(rendered) => self.html(code, rendered),
            Err(err) => {
                error!(template = name, %err, "template render failed");
                self.error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
            }
        }
    }

    /// Redirect to `location` with the given 3xx status. Dropped whole,
    /// Location header included, if a terminal write already happened.
    pub fn redirect(&mut self, code: StatusCode, location: &str) {
        if self.check_double_write() {
            return;
        }
        self.set_header("Location", location);
        self.status(code);
    }

    /// Write a plain-text error body, like the not-found and recovery paths.
    pub fn error_response(&mut self, code: StatusCode, msg: &str) {
        if self.check_double_write() {
            return;
        }
        self.set_header("Content-Type", render::CONTENT_TYPE_TEXT);
        self.set_header("X-Content-Type-Options", "nosniff");
        self.status(code);
        self.write_body(Bytes::from(format!("{}\n", msg)));
    }

    // ------------------------------------------------------------------
    // Binding helpers
    // ------------------------------------------------------------------

    /// Decode the request body as JSON. Consumes the one-shot body read.
    pub fn bind_json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self.body();
        Ok(serde_json::from_slice(&body)?)
    }

    /// Decode the request body as JSON, then run the target's validation.
    pub fn bind_json_validated<T: DeserializeOwned + Validate>(&mut self) -> Result<T> {
        let value: T = self.bind_json()?;
        value.validate()?;
        Ok(value)
    }

    /// Bind the query string into a schema-described struct.
    pub fn bind_query<T: DeserializeOwned + Schema>(&self) -> Result<T> {
        let args = bind::parse_pairs(self.query.as_deref().unwrap_or(""), true);
        bind::from_map(&args)
    }

    /// Bind the urlencoded body merged with the query string (query values
    /// win) into a schema-described struct.
    pub fn bind_form<T: DeserializeOwned + Schema>(&self) -> Result<T> {
        let body = String::from_utf8_lossy(&self.raw_body);
        let mut args = bind::parse_pairs(&body, true);
        for (key, value) in bind::parse_pairs(self.query.as_deref().unwrap_or(""), true) {
            args.insert(key, value);
        }
        bind::from_map(&args)
    }

    /// Decode the request body as a protobuf message. Consumes the one-shot
    /// body read.
    #[cfg(feature = "protobuf")]
    pub fn bind_protobuf<T: prost::Message + Default>(&mut self) -> Result<T> {
        let body = self.body();
        Ok(T::decode(body)?)
    }

    /// Encode a protobuf message and write it.
    #[cfg(feature = "protobuf")]
    pub fn render_protobuf<M: prost::Message>(&mut self, code: StatusCode, message: &M) -> Result<()> {
        let encoded = message.encode_to_vec();
        if self.check_double_write() {
            return Ok(());
        }
        self.set_header("Content-Type", render::CONTENT_TYPE_PROTOBUF);
        self.status(code);
        self.write_body(Bytes::from(encoded));
        Ok(())
    }

    // ------------------------------------------------------------------

    pub(crate) fn into_response(self) -> Response {
        self.response
    }

    fn write_body(&mut self, body: Bytes) {
        self.body_written = true;
        self.response.set_body(body);
    }

    /// True (and logged) when a terminal write already happened.
    fn check_double_write(&self) -> bool {
        if self.body_written {
            warn!(
                method = %self.method,
                path = %self.path,
                "response body already written; dropping second write"
            );
        }
        self.body_written
    }
}

#[cfg(test)]
impl Context {
    pub(crate) fn test_request(method: Method, path: &str) -> Self {
        Self::new(
            method,
            path.to_string(),
            None,
            HeaderMap::new(),
            Bytes::new(),
            Vec::new(),
            JsonCodec::default(),
            None,
        )
    }

    pub(crate) fn test_request_full(
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Bytes,
    ) -> Self {
        Self::new(
            method,
            path.to_string(),
            query.map(|s| s.to_string()),
            HeaderMap::new(),
            body,
            Vec::new(),
            JsonCodec::default(),
            None,
        )
    }
}
