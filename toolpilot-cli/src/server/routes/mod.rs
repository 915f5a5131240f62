pub mod health;
pub mod query;
pub mod tools;

use super::dto::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;

pub(super) type Rejection = (StatusCode, Json<ErrorResponse>);

pub(super) fn reject(status: StatusCode, detail: impl Into<String>) -> Rejection {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}
