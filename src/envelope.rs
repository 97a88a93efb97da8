//! JSONP envelope handling.
//!
//! The endpoint answers `<callback>(<json>);`. The callback name only makes
//! the body recognizable, so it is stripped before parsing.
use crate::error::FetchError;
use crate::types::PageResult;

/// Returns the JSON text wrapped by `callback(` ... `);`.
pub fn unwrap_jsonp<'a>(body: &'a str, callback: &str) -> Result<&'a str, FetchError> {
    let body = body.trim();
    let inner = body
        .strip_prefix(callback)
        .and_then(|rest| rest.strip_prefix('('))
        .ok_or_else(|| FetchError::malformed(format!("missing `{}(` prefix", callback)))?;
    inner
        .strip_suffix(");")
        .ok_or_else(|| FetchError::malformed("missing trailing `);`"))
}

pub fn parse_page(body: &str, callback: &str) -> Result<PageResult, FetchError> {
    let json = unwrap_jsonp(body, callback)?;
    serde_json::from_str(json).map_err(|e| FetchError::malformed(e.to_string()))
}
