//! URI construction and filter-value escaping.

use thiserror::Error;
use url::form_urlencoded;

/// Errors raised while building a request URI.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("Path requires `{0}` parameter, but none is given.")]
    MissingPathParameter(String),

    #[error("Path specifies an invalid path parameter. Parameter name must not be empty.")]
    EmptyPathParameter,

    #[error("Path contains an unterminated `{{` placeholder.")]
    UnterminatedPlaceholder,
}

/// Joins a base URI and a path, collapsing the slash at the seam.
pub fn append_path(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    let base = base.strip_suffix('/').unwrap_or(base);
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{base}/{path}")
}

/// Builds a fully qualified URI.
///
/// `{name}` placeholders in `path` are substituted from `path_params`. Query
/// parameters keep their given order and are form-encoded, so spaces become
/// `+` and reserved characters are percent-escaped.
pub fn build_qualified_uri(
    base: &str,
    path: &str,
    path_params: &[(&str, &str)],
    query_params: &[(String, String)],
) -> Result<String, UriError> {
    let path = substitute_path_params(path, path_params)?;
    let mut uri = append_path(base, &path);

    if !query_params.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query_params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        uri.push('?');
        uri.push_str(&query);
    }
    Ok(uri)
}

fn substitute_path_params(path: &str, params: &[(&str, &str)]) -> Result<String, UriError> {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or(UriError::UnterminatedPlaceholder)?;
        let name = &after[..end];
        if name.is_empty() {
            return Err(UriError::EmptyPathParameter);
        }
        let value = params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| UriError::MissingPathParameter(name.to_string()))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Escapes the characters that carry meaning in the filter query grammar.
///
/// Backslash, colon, comma and semicolon are each prefixed with a backslash.
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | ':' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// The `User-Agent` header value for a given transport identifier.
pub fn user_agent(transport: &str) -> String {
    format!(
        "{transport}/{} rust/{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}
