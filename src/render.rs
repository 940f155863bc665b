//! Response rendering: content-type constants, the JSON codec, and the
//! template-engine seam.

use std::fmt;

use serde::Serialize;

use crate::core::{Error, Result};

pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_JSON: &str = "application/json";
#[cfg(feature = "protobuf")]
pub const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";

/// JSON encoding configuration carried by the engine and handed to each
/// request context; no process-global state.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit indented output. Compact is the default.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(encoded)
    }
}

/// Template rendering collaborator, configured on the engine and shared by
/// every request. Implementations bring their own template storage.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String>;
}

impl fmt::Debug for dyn TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemplateEngine")
    }
}

/// Convenience for tests and small apps: renders by substituting
/// `{{key}}` placeholders from the top-level object.
pub struct PlaceholderTemplates {
    templates: std::collections::HashMap<String, String>,
}

impl PlaceholderTemplates {
    pub fn new() -> Self {
        Self {
            templates: std::collections::HashMap::new(),
        }
    }

    pub fn add(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }
}

impl Default for PlaceholderTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for PlaceholderTemplates {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String> {
        let body = self
            .templates
            .get(name)
            .ok_or_else(|| Error::Render(format!("unknown template {:?}", name)))?;
        let mut out = body.clone();
        if let Some(object) = data.as_object() {
            for (key, value) in object {
                let needle = format!("{{{{{}}}}}", key);
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out = out.replace(&needle, &text);
            }
        }
        Ok(out)
    }
}
