//! JSON-RPC 2.0 envelopes exchanged by the LSP host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request not valid in the current state.
pub(super) const INVALID_REQUEST: i64 = -32600;
/// Method is not served.
pub(super) const METHOD_NOT_FOUND: i64 = -32601;
/// Payload was not valid JSON.
pub(super) const PARSE_ERROR: i64 = -32700;

/// Any message the client sends: request, notification, or response.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct IncomingMessage {
    /// Present on requests; absent on notifications.
    #[serde(default)]
    pub id: Option<Value>,
    /// Absent on responses to server-initiated requests.
    #[serde(default)]
    pub method: Option<String>,
}

/// Response sent back for a request.
#[derive(Debug, Clone, Serialize)]
pub(super) struct OutgoingResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ResponseError>,
}

impl OutgoingResponse {
    pub(super) const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub(super) fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ResponseError {
    code: i64,
    message: String,
}
