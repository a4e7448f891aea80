use axum::http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::api::models::{NewspaperReply, NewspaperRequest};
use crate::error::Status;
use crate::servicer::Servicer;

/// The single method served. Callers must use this exact name.
pub const EXTRACT_NEWSPAPER: &str = "extractNewspaper";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    /// Absent for notifications. An explicit `null` is still a request.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

/// Parameters of `extractNewspaper`. The key is `Link`, matched case-sensitively.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractNewspaperParams {
    #[serde(rename = "Link")]
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractNewspaperResult {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Authors")]
    pub authors: Vec<String>,
    #[serde(rename = "Canonical")]
    pub canonical: String,
    #[serde(rename = "PubDate")]
    pub pubdate: String,
}

impl From<NewspaperReply> for ExtractNewspaperResult {
    fn from(reply: NewspaperReply) -> Self {
        Self {
            title: reply.title,
            text: reply.text,
            authors: reply.authors,
            canonical: reply.canonical,
            pubdate: reply.pubdate,
        }
    }
}

/// Runs one JSON-RPC 2.0 request body against the servicer.
pub async fn dispatch(servicer: &Servicer, body: &[u8]) -> (StatusCode, Option<JsonRpcResponse>) {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "json-rpc parse error");
            return (
                StatusCode::BAD_REQUEST,
                Some(JsonRpcResponse::error(Value::Null, PARSE_ERROR, "Parse error")),
            );
        }
    };

    let request = match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) if request.jsonrpc == "2.0" => request,
        Ok(_) | Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Some(JsonRpcResponse::error(Value::Null, INVALID_REQUEST, "Invalid Request")),
            );
        }
    };

    let id = request.id.clone();
    let (status, outcome) = call(servicer, request).await;
    let Some(id) = id else {
        return (StatusCode::NO_CONTENT, None);
    };

    let response = match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::error(id, error.code, error.message),
    };
    (status, Some(response))
}

fn rpc_error(code: i64, message: &str) -> JsonRpcError {
    JsonRpcError {
        code,
        message: message.to_string(),
    }
}

async fn call(
    servicer: &Servicer,
    request: JsonRpcRequest,
) -> (StatusCode, std::result::Result<Value, JsonRpcError>) {
    if request.method != EXTRACT_NEWSPAPER {
        tracing::warn!(method = %request.method, "json-rpc method not found");
        return (
            StatusCode::NOT_FOUND,
            Err(rpc_error(METHOD_NOT_FOUND, "Method not found")),
        );
    }

    let params = request
        .params
        .and_then(|params| serde_json::from_value::<ExtractNewspaperParams>(params).ok());
    let Some(params) = params else {
        tracing::warn!(method = EXTRACT_NEWSPAPER, "json-rpc invalid params");
        return (
            StatusCode::BAD_REQUEST,
            Err(rpc_error(INVALID_PARAMS, "Invalid params")),
        );
    };

    let reply = servicer
        .newspaper(NewspaperRequest { link: params.link })
        .await;

    match reply.status {
        Status::Ok => match serde_json::to_value(ExtractNewspaperResult::from(reply.message)) {
            Ok(result) => (StatusCode::OK, Ok(result)),
            Err(err) => {
                tracing::error!(error = %err, "failed to encode json-rpc result");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Err(rpc_error(INTERNAL_ERROR, "Internal error")),
                )
            }
        },
        Status::InvalidArgument => (
            StatusCode::BAD_REQUEST,
            Err(rpc_error(INVALID_PARAMS, "Invalid params")),
        ),
        Status::Internal => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Err(rpc_error(INTERNAL_ERROR, "Internal error")),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_key_is_case_sensitive() {
        assert!(serde_json::from_value::<ExtractNewspaperParams>(json!({"Link": "x"})).is_ok());
        assert!(serde_json::from_value::<ExtractNewspaperParams>(json!({"link": "x"})).is_err());
        assert!(
            serde_json::from_value::<ExtractNewspaperParams>(json!({"Link": "x", "Extra": 1}))
                .is_err()
        );
    }

    #[test]
    fn result_uses_capitalized_keys() {
        let result = ExtractNewspaperResult::from(NewspaperReply {
            link: "https://example.com".to_string(),
            title: "Title".to_string(),
            text: "Body".to_string(),
            canonical: "https://example.com/c".to_string(),
            pubdate: String::new(),
            authors: vec!["A".to_string()],
        });
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({
                "Title": "Title",
                "Text": "Body",
                "Authors": ["A"],
                "Canonical": "https://example.com/c",
                "PubDate": ""
            })
        );
    }

    #[test]
    fn only_an_absent_id_is_a_notification() {
        let absent: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "m"})).unwrap();
        assert_eq!(absent.id, None);

        let null: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "m", "id": null})).unwrap();
        assert_eq!(null.id, Some(Value::Null));
    }

    #[test]
    fn error_response_omits_result() {
        let response = JsonRpcResponse::error(json!(7), INTERNAL_ERROR, "Internal error");
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": -32603, "message": "Internal error"}, "id": 7})
        );
    }
}
