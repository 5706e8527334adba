//! Decoding of write requests into block payloads.
//!
//! Runs before any block is built, so a malformed request never reaches the
//! factory. Failures come back as [`ChainError::InvalidPayload`] with a
//! description of what was wrong, not an echo of the raw body.

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, ChainResult};

/// Body of a write request: `{"payload": 100}`.
///
/// `Data` and `data` are accepted as aliases for clients written against
/// the older `{"Data": 100}` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteRequest {
    #[serde(alias = "Data", alias = "data")]
    pub payload: i64,
}

/// Decode a JSON request body into a payload.
pub fn decode_payload(body: &[u8]) -> ChainResult<i64> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ChainError::InvalidPayload(
            "request body is empty".to_string(),
        ));
    }

    serde_json::from_slice::<WriteRequest>(body)
        .map(|req| req.payload)
        .map_err(|e| ChainError::InvalidPayload(describe(&e)))
}

fn describe(err: &serde_json::Error) -> String {
    use serde_json::error::Category;

    match err.classify() {
        Category::Syntax | Category::Eof => {
            format!("body is not valid JSON (line {}, column {})", err.line(), err.column())
        }
        // serde's data errors quote the offending value, so only the
        // position is reported.
        Category::Data => format!(
            "expected {{\"payload\": <integer>}} (line {}, column {})",
            err.line(),
            err.column()
        ),
        Category::Io => "failed to read request body".to_string(),
    }
}
