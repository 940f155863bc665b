//! Static file serving for a mounted directory.
//!
//! The route table only matches literally, so the registered pattern
//! (`<mount>/*filepath`) is itself a literal key; the handler recovers the
//! relative file path from the `filepath` route parameter when a dispatcher
//! supplies one, or by stripping the mount prefix from the raw request path.

use std::path::{Component, Path, PathBuf};

use http::StatusCode;
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::core::{Context, Handler};

pub(crate) fn static_handler(mount: String, root: PathBuf) -> impl Handler {
    move |ctx: &mut Context| {
        let relative = match relative_path(ctx, &mount) {
            Some(rel) => rel,
            None => {
                ctx.error_response(StatusCode::NOT_FOUND, "file not found");
                return;
            }
        };
        serve_file(ctx, &root, &relative);
    }
}

/// Relative path under the mount, percent-decoded. Prefers the `filepath`
/// route parameter, falling back to prefix stripping.
fn relative_path(ctx: &Context, mount: &str) -> Option<String> {
    let raw = match ctx.param("filepath") {
        Some(p) => p.to_string(),
        None => ctx
            .path()
            .strip_prefix(mount)?
            .trim_start_matches('/')
            .to_string(),
    };
    Some(percent_decode_str(&raw).decode_utf8_lossy().into_owned())
}

fn serve_file(ctx: &mut Context, root: &Path, relative: &str) {
    let full = match resolve_under_root(root, relative) {
        Some(path) => path,
        None => {
            debug!(relative, "rejecting static path outside root");
            ctx.error_response(StatusCode::NOT_FOUND, "file not found");
            return;
        }
    };

    match std::fs::read(&full) {
        Ok(contents) => {
            let mime = mime_guess::from_path(&full).first_or_octet_stream();
            ctx.set_header("Content-Type", mime.as_ref());
            ctx.data(StatusCode::OK, contents);
        }
        Err(err) => {
            debug!(path = %full.display(), %err, "static file unreadable");
            ctx.error_response(StatusCode::NOT_FOUND, "file not found");
        }
    }
}

/// Join `relative` under `root`, refusing any component that would climb out
/// of it. Returns None for absolute paths, `..`, or an empty result.
fn resolve_under_root(root: &Path, relative: &str) -> Option<PathBuf> {
    if relative.is_empty() {
        return None;
    }
    let mut full = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => full.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(full)
}
