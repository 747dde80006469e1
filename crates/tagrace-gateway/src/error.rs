//! HTTP mapping for errors raised before a poll stream starts.
//!
//! Once the `200` header is out, failures never reach the client as a frame;
//! they only show up as missing lines.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tagrace_core::error::{ClientCode, TagRaceError};

#[derive(Debug)]
pub struct ApiError(pub TagRaceError);

impl From<TagRaceError> for ApiError {
    fn from(e: TagRaceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = match code {
            ClientCode::BadRequest => StatusCode::BAD_REQUEST,
            ClientCode::Timeout => StatusCode::REQUEST_TIMEOUT,
            ClientCode::StoreUnavailable | ClientCode::StreamFailed => StatusCode::SERVICE_UNAVAILABLE,
            ClientCode::Config | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
