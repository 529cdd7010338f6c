//! Document loading from files, strings and HTTP URLs, plus JSON Pointer helpers.

use std::path::Path;

use serde_json::Value;
use tracing::info;
use url::Url;

use crate::error::ResolveError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a schema document from a file path.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist,
/// or `ResolveError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ResolveError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    info!("loaded {}", path.display());
    load_schema_str(&content)
}

/// Load a schema document from a JSON string.
///
/// # Errors
///
/// Returns `ResolveError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, ResolveError> {
    serde_json::from_str(content).map_err(|source| ResolveError::InvalidJson { source })
}

/// Load a schema document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ResolveError::NetworkError` if the request fails or the body
/// isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<Value, ResolveError> {
    let network_error = |source| ResolveError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(network_error)?;

    let value = response.json().map_err(network_error)?;
    info!("fetched {}", url);
    Ok(value)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Convert a CLI-style source (file path or URL) into a document URL.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` for a missing file and
/// `ResolveError::InvalidId` for a malformed URL.
pub fn source_url(source: &str) -> Result<Url, ResolveError> {
    if is_url(source) || source.starts_with("file://") {
        return Url::parse(source).map_err(|e| ResolveError::InvalidId {
            id: source.to_string(),
            message: e.to_string(),
        });
    }

    let path = Path::new(source);
    let canonical = path
        .canonicalize()
        .map_err(|_| ResolveError::FileNotFound {
            path: path.to_path_buf(),
        })?;
    Url::from_file_path(&canonical).map_err(|_| ResolveError::InvalidId {
        id: source.to_string(),
        message: "not an absolute file path".to_string(),
    })
}

/// Load the document at a URL, dispatching on its scheme.
///
/// # Errors
///
/// Returns `ResolveError::UnsupportedScheme` for schemes other than `file`
/// and (with the `remote` feature) `http`/`https`.
pub fn load_document(url: &Url) -> Result<Value, ResolveError> {
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| ResolveError::UnsupportedScheme {
                    url: url.to_string(),
                })?;
            load_schema(&path)
        }
        #[cfg(feature = "remote")]
        "http" | "https" => load_schema_url(url.as_str()),
        _ => Err(ResolveError::UnsupportedScheme {
            url: url.to_string(),
        }),
    }
}

/// Escape a key for use as a JSON Pointer segment (`~` → `~0`, `/` → `~1`).
pub fn escape_pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Unescape a JSON Pointer segment (`~1` → `/`, `~0` → `~`).
pub fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Navigate a JSON Pointer (e.g., "/definitions/foo" or "#/properties/bar").
///
/// Array elements are addressed by index. Returns `None` when any segment
/// is missing.
///
/// `pointer` is already percent-decoded (see `SchemaId::fragment`).
pub fn navigate_pointer<'a>(value: &'a Value, pointer: &str) -> Option<&'a Value> {
    let path = pointer.trim_start_matches('#');
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for part in path.trim_start_matches('/').split('/') {
        let key = unescape_pointer_segment(part);
        current = match current {
            Value::Object(map) => map.get(&key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
