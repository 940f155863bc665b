//! Connection handling between hyper and the engine.
//!
//! Requests are buffered in full, dispatched through the synchronous handler
//! chain on the blocking pool, and the buffered response is handed back to
//! hyper. Panics that escape the chain (no recovery middleware installed)
//! surface here as a failed join and become an empty 500.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::core::{Response, Result};
use crate::engine::Engine;

pub(crate) async fn serve(engine: Arc<Engine>, listener: TcpListener) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(%peer, %err, "set_nodelay failed");
        }

        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(Arc::clone(&engine), req));
            let io = TokioIo::new(stream);
            if let Err(err) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                debug!(%peer, %err, "connection error");
            }
        });
    }
}

async fn handle_request(
    engine: Arc<Engine>,
    req: hyper::Request<Incoming>,
) -> std::result::Result<hyper::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            debug!(%err, "failed to read request body");
            return Ok(Response::empty(http::StatusCode::BAD_REQUEST).into_http());
        }
    };
    let buffered = hyper::Request::from_parts(parts, body);

    let outcome = tokio::task::spawn_blocking(move || engine.dispatch(buffered)).await;
    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            // a panic crossed the chain boundary without recovery installed
            error!(%err, "request task failed");
            Response::empty(http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    Ok(response.into_http())
}
