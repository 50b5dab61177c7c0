use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("backend reply is not well-formed JSON: {0}")]
pub struct ParseError(#[from] serde_json::Error);

/// Syntactic check only. Missing keys and odd value types pass through.
pub fn parse_reply(raw: &str) -> Result<Value, ParseError> {
    Ok(serde_json::from_str(raw)?)
}
