//! Core types shared by the resolver, normalizer and generator.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{Map, Value};
use url::Url;

use crate::error::ResolveError;
use crate::loader::unescape_pointer_segment;

/// Keys that may carry a schema identifier (`id` is the draft-04 spelling).
pub const ID_KEYS: &[&str] = &["$id", "id"];

/// Characters escaped when a fragment is written back into an absolute id.
/// `%` is included so decoding the written form restores the fragment exactly.
const FRAGMENT_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// File extensions stripped from the last path segment when deriving type names.
const DOCUMENT_EXTENSIONS: &[&str] = &[".json", ".yaml", ".yml"];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JavaScript-style truthiness of a JSON value.
///
/// `null`, `false`, `0` and `""` are falsy; everything else (including empty
/// objects and arrays) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Returns the identifier declared directly on a schema object, if any.
pub fn declared_id(map: &Map<String, Value>) -> Option<&str> {
    ID_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
}

/// Canonical identifier of a schema node.
///
/// Combines the document location (a URL without fragment) with the
/// percent-decoded fragment, usually a JSON pointer. Two ids are equal when their absolute
/// strings are equal. The empty id marks an anonymous sub-schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId {
    document: Option<Url>,
    fragment: String,
}

impl SchemaId {
    /// The empty (anonymous) id.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse an absolute id such as `https://example.com/a.json#/definitions/b`.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidId` if the document part is not an absolute URL.
    pub fn parse(id: &str) -> Result<Self, ResolveError> {
        let (document, fragment) = split_fragment(id);
        let mut url = Url::parse(document).map_err(|e| ResolveError::InvalidId {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        url.set_fragment(None);
        Ok(Self {
            document: Some(url),
            fragment: decode(fragment),
        })
    }

    /// The id of a whole document.
    pub fn from_url(mut url: Url) -> Self {
        url.set_fragment(None);
        Self {
            document: Some(url),
            fragment: String::new(),
        }
    }

    /// Resolve a possibly relative reference against this id.
    ///
    /// An empty document part (`#/definitions/a`) stays in this id's document.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidId` if the reference cannot be joined,
    /// including relative references against the empty id.
    pub fn join(&self, reference: &str) -> Result<Self, ResolveError> {
        let (document, fragment) = split_fragment(reference);
        let invalid = |message: String| ResolveError::InvalidId {
            id: reference.to_string(),
            message,
        };
        let mut url = match &self.document {
            Some(base) if document.is_empty() => base.clone(),
            Some(base) => base.join(document).map_err(|e| invalid(e.to_string()))?,
            None => Url::parse(document).map_err(|e| invalid(e.to_string()))?,
        };
        url.set_fragment(None);
        Ok(Self {
            document: Some(url),
            fragment: decode(fragment),
        })
    }

    /// The id of a sub-schema at `pointer` below this id.
    pub fn child(&self, pointer: &str) -> Self {
        Self {
            document: self.document.clone(),
            fragment: format!("{}{}", self.fragment, pointer),
        }
    }

    /// The id of the document this id points into.
    pub fn document_id(&self) -> Self {
        Self {
            document: self.document.clone(),
            fragment: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_none()
    }

    pub fn url(&self) -> Option<&Url> {
        self.document.as_ref()
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Absolute string form; empty for the anonymous id.
    pub fn absolute_id(&self) -> String {
        match &self.document {
            None => String::new(),
            Some(url) if self.fragment.is_empty() => url.to_string(),
            Some(url) => format!(
                "{}#{}",
                url,
                utf8_percent_encode(&self.fragment, FRAGMENT_ESCAPES)
            ),
        }
    }

    /// Identifier segments naming this schema, outermost first.
    pub fn type_names(&self) -> Vec<String> {
        let Some(url) = &self.document else {
            return Vec::new();
        };

        let mut raw: Vec<String> = Vec::new();
        let path: Vec<String> = match url.path_segments() {
            Some(segments) => segments.filter(|s| !s.is_empty()).map(decode).collect(),
            // opaque ids such as `urn:example:tag`
            None => url
                .path()
                .split(':')
                .filter(|s| !s.is_empty())
                .map(decode)
                .collect(),
        };

        if url.scheme() == "file" {
            if let Some(last) = path.last() {
                raw.push(strip_extension(last).to_string());
            }
        } else {
            if let Some(host) = url.host_str() {
                raw.push(host.to_string());
            }
            let count = path.len();
            for (i, segment) in path.iter().enumerate() {
                if i + 1 == count {
                    raw.push(strip_extension(segment).to_string());
                } else {
                    raw.push(segment.to_string());
                }
            }
        }

        raw.extend(
            self.fragment
                .split('/')
                .filter(|s| !s.is_empty())
                .map(unescape_pointer_segment),
        );

        raw.iter().map(|s| to_type_name(s)).collect()
    }

    /// The local type name of this schema (its last name segment).
    pub fn last_type_name(&self) -> String {
        self.type_names().pop().unwrap_or_else(|| "_".to_string())
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.absolute_id())
    }
}

fn decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

fn split_fragment(id: &str) -> (&str, &str) {
    match id.find('#') {
        Some(idx) => (&id[..idx], &id[idx + 1..]),
        None => (id, ""),
    }
}

fn strip_extension(segment: &str) -> &str {
    DOCUMENT_EXTENSIONS
        .iter()
        .find_map(|ext| segment.strip_suffix(ext))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(segment)
}

/// Convert an arbitrary name segment into a PascalCase identifier.
pub fn to_type_name(segment: &str) -> String {
    let mut name = String::new();
    for word in segment
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    if name.is_empty() {
        return "_".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Raw schema content paired with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub id: SchemaId,
    pub content: Value,
}

impl Schema {
    pub fn new(id: SchemaId, content: Value) -> Self {
        Self { id, content }
    }
}

/// A schema after normalization.
///
/// The content is always an object: no `allOf`, no `nullable`, and a `type`
/// array holds at least two distinct entries.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSchema {
    pub id: SchemaId,
    pub content: Map<String, Value>,
}

impl NormalizedSchema {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.content.contains_key(key)
    }

    /// The declared `type` when it is a single string.
    pub fn type_name(&self) -> Option<&str> {
        self.content.get("type").and_then(|t| t.as_str())
    }

    /// Whether the declared type renders numerically (`integer` or `number`).
    pub fn is_numeric(&self) -> bool {
        matches!(self.type_name(), Some("integer" | "number"))
    }

    /// The schema as a plain value, for re-entering the normalizer.
    pub fn to_schema(&self) -> Schema {
        Schema::new(self.id.clone(), Value::Object(self.content.clone()))
    }
}

/// Target-language primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Any,
    Never,
    Null,
    Undefined,
    String,
    Number,
    Boolean,
}

impl Primitive {
    /// Map a JSON Schema primitive type name.
    ///
    /// Returns `None` for `object`, `array` and unknown names (caller decides).
    pub fn from_schema_type(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Primitive::Null),
            "undefined" => Some(Primitive::Undefined),
            "string" => Some(Primitive::String),
            "integer" | "number" => Some(Primitive::Number),
            "boolean" => Some(Primitive::Boolean),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Primitive::Any => "any",
            Primitive::Never => "never",
            Primitive::Null => "null",
            Primitive::Undefined => "undefined",
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
        }
    }
}
