use mettakg_explorer::ExploreEntry;
use mettakg_explorer::ExploreError;
use mettakg_explorer::NavToken;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::percent_encode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Everything except the unreserved URL characters `A-Z a-z 0-9 - _ . ~`.
const TOKEN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes a token for the request body. The empty token encodes to
/// the empty string.
pub fn encode_token(token: &NavToken) -> String {
    percent_encode(token.as_bytes(), TOKEN_ENCODE_SET).to_string()
}

#[derive(Debug, Serialize)]
pub(crate) struct ExploreRequest<'a> {
    pub pattern: &'a str,
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    expr: String,
    #[serde(default)]
    token: RawToken,
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum RawToken {
    Bytes(Vec<i64>),
    Text(String),
    #[default]
    Absent,
}

impl RawToken {
    fn into_bytes(self) -> Result<Vec<u8>, String> {
        match self {
            RawToken::Bytes(values) => values
                .into_iter()
                .map(|value| match value {
                    // Signed bytes: -1 is the sentinel 0xFF.
                    -128..=-1 => Ok((value + 256) as u8),
                    0..=255 => Ok(value as u8),
                    _ => Err(format!("token value {value} is not a byte")),
                })
                .collect(),
            RawToken::Text(text) => Ok(text.into_bytes()),
            RawToken::Absent => Ok(Vec::new()),
        }
    }
}

/// Parses an explore response body.
///
/// The backend sometimes wraps the array in a JSON string, so one level of
/// string encoding is unwrapped first. Entries that do not validate are
/// skipped with a warning; only a body that is not an array is an error.
pub fn parse_explore_body(body: &str) -> Result<Vec<ExploreEntry>, ExploreError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| ExploreError::InvalidResponse(format!("body is not JSON: {err}")))?;
    let value = match value {
        Value::String(inner) => serde_json::from_str(&inner).map_err(|err| {
            ExploreError::InvalidResponse(format!("string body is not JSON: {err}"))
        })?,
        other => other,
    };
    let Value::Array(items) = value else {
        return Err(ExploreError::InvalidResponse(format!(
            "expected an array of entries, got {}",
            kind(&value)
        )));
    };

    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match parse_entry(item) {
            Ok(entry) => entries.push(entry),
            Err(reason) => warn!("skipping explore entry {index}: {reason}"),
        }
    }
    Ok(entries)
}

fn parse_entry(item: Value) -> Result<ExploreEntry, String> {
    let raw: RawEntry = serde_json::from_value(item).map_err(|err| err.to_string())?;
    let token = raw.token.into_bytes()?;
    Ok(ExploreEntry::new(raw.expr, token))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
