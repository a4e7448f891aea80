use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::jsonrpc::JsonRpcResponse;
use crate::servicer::RpcReply;

pub const GRPC_STATUS: HeaderName = HeaderName::from_static("grpc-status");

/// Reply message as the JSON body, status in both the HTTP status line and `grpc-status`.
pub fn rpc<T: Serialize>(reply: RpcReply<T>) -> Response {
    let status = reply.status;
    (
        status.http_status(),
        [(GRPC_STATUS, HeaderValue::from(status.code()))],
        Json(reply.message),
    )
        .into_response()
}

/// `None` means the call was a notification and gets no body.
pub fn json_rpc(status: StatusCode, body: Option<JsonRpcResponse>) -> Response {
    match body {
        Some(body) => (status, Json(body)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
