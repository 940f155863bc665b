//! Request binding: JSON bodies and schema-described query/form pairs.
//!
//! JSON binding goes straight through serde. Query and form binding work on
//! flat `key=value` pairs, so deserialization is driven by an explicit
//! [`Schema`]: each field names its wire key and scalar kind, the binder
//! coerces the string value to that kind, and the result is handed to serde
//! as a JSON object. Key matching is case-insensitive.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::core::{Error, Result};

/// Scalar kind a bound field coerces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    I64,
    U64,
    F64,
    Bool,
}

/// One bindable field: its serde name, target kind, and whether a missing
/// value is an error.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }
}

/// Field descriptor table for query/form binding targets.
///
/// The slice must have a `'static` home; bind it to a `const` (a braced
/// array literal would be a function-local temporary):
///
/// ```
/// use pylon::bind::{FieldKind, FieldSpec, Schema};
///
/// struct Search {
///     q: String,
/// }
///
/// impl Schema for Search {
///     fn fields() -> &'static [FieldSpec] {
///         const FIELDS: &[FieldSpec] = &[FieldSpec::required("q", FieldKind::Str)];
///         FIELDS
///     }
/// }
/// ```
pub trait Schema {
    fn fields() -> &'static [FieldSpec];
}

/// Post-deserialization validation hook, run by
/// [`Context::bind_json_validated`](crate::Context::bind_json_validated).
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Decode a JSON byte slice into `T`.
pub fn from_json<T: DeserializeOwned>(raw: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(raw)?)
}

/// Bind flat string pairs into `T` through its schema.
///
/// Keys in `args` are expected lowercased (see [`parse_pairs`] with
/// `lowercase = true`); field names are lowercased at lookup to match.
pub fn from_map<T: DeserializeOwned + Schema>(args: &HashMap<String, String>) -> Result<T> {
    let mut object = Map::new();
    for field in T::fields() {
        let key = field.name.to_ascii_lowercase();
        match args.get(&key) {
            Some(raw) => {
                let value = coerce(field, raw)?;
                object.insert(field.name.to_string(), value);
            }
            None if field.required => {
                return Err(Error::Bind(format!("missing required field {:?}", field.name)));
            }
            None => {}
        }
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|err| Error::Bind(format!("deserialize failed: {}", err)))
}

fn coerce(field: &FieldSpec, raw: &str) -> Result<Value> {
    let value = match field.kind {
        FieldKind::Str => Value::String(raw.to_string()),
        FieldKind::I64 => {
            let n: i64 = raw
                .parse()
                .map_err(|_| bad_value(field, raw, "integer"))?;
            Value::Number(Number::from(n))
        }
        FieldKind::U64 => {
            let n: u64 = raw
                .parse()
                .map_err(|_| bad_value(field, raw, "unsigned integer"))?;
            Value::Number(Number::from(n))
        }
        FieldKind::F64 => {
            let n: f64 = raw.parse().map_err(|_| bad_value(field, raw, "float"))?;
            Value::Number(Number::from_f64(n).ok_or_else(|| bad_value(field, raw, "float"))?)
        }
        FieldKind::Bool => Value::Bool(parse_bool(raw).ok_or_else(|| bad_value(field, raw, "bool"))?),
    };
    Ok(value)
}

fn bad_value(field: &FieldSpec, raw: &str, want: &str) -> Error {
    Error::Bind(format!(
        "field {:?}: cannot parse {:?} as {}",
        field.name, raw, want
    ))
}

/// Accepts the conventional truthy/falsy spellings: 1/0, t/f, true/false in
/// upper, lower, and title case.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Split a `k=v&k2=v2` string into a map, percent-decoding keys and values
/// and treating `+` as space. The first occurrence of a key wins. With
/// `lowercase` set, keys are lowered for case-insensitive schema lookup.
pub(crate) fn parse_pairs(raw: &str, lowercase: bool) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for piece in raw.split('&') {
        if piece.is_empty() {
            continue;
        }
        let (key, value) = match piece.split_once('=') {
            Some((k, v)) => (k, v),
            None => (piece, ""),
        };
        let mut key = decode_component(key);
        if lowercase {
            key.make_ascii_lowercase();
        }
        let value = decode_component(value);
        pairs.entry(key).or_insert(value);
    }
    pairs
}

fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    percent_decode_str(&plus_decoded).decode_utf8_lossy().into_owned()
}
