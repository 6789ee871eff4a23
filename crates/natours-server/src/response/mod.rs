//! Success response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// `{ "status": "success", "results"?, "requestedAt"?, "data": ... }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requested_at: Option<DateTime<Utc>>,
    data: T,
    #[serde(skip)]
    status_code: StatusCode,
}

/// Wrapper that nests a payload under `data`.
#[derive(Debug, Serialize)]
pub struct Document<T> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            results: None,
            requested_at: None,
            data,
            status_code: StatusCode::OK,
        }
    }

    pub fn created(mut self) -> Self {
        self.status_code = StatusCode::CREATED;
        self
    }

    pub fn requested_at(mut self, at: DateTime<Utc>) -> Self {
        self.requested_at = Some(at);
        self
    }
}

impl<T: Serialize> ApiResponse<Document<T>> {
    /// Single record: `data.data`.
    pub fn document(data: T) -> Self {
        Self::new(Document { data })
    }
}

impl<T: Serialize> ApiResponse<Document<Vec<T>>> {
    /// Record list with a `results` count.
    pub fn list(items: Vec<T>) -> Self {
        let mut response = Self::new(Document { data: items });
        response.results = Some(response.data.data.len());
        response
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// 204 with no body, used for deletions.
pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
