//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod datastore;
mod requirements;
mod schedule;
mod staff;

pub use datastore::*;
pub use requirements::*;
pub use schedule::*;
pub use staff::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Day, ShiftType};
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: crate::errors::AppError, revision_id: i64) -> ApiResult<T> {
    Err(crate::errors::AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Parse `{day}/{shift}` path segments.
fn parse_cell(day: &str, shift: &str) -> Result<(Day, ShiftType), AppError> {
    let day = Day::from_label(day)
        .ok_or_else(|| AppError::Validation(format!("Unknown day '{}'", day)))?;
    let shift = ShiftType::from_label(shift)
        .ok_or_else(|| AppError::Validation(format!("Unknown shift type '{}'", shift)))?;
    Ok((day, shift))
}

// The in-memory transition has already happened; a failed save only risks
// losing it on restart. The snapshot is taken under the save guard, so
// overlapping saves cannot land out of order.

async fn persist_schedule(state: &AppState) {
    let (_saving, schedule) = state.schedule.schedule_for_save().await;
    if let Err(e) = state.repo.save_schedule(&schedule).await {
        tracing::warn!("Failed to persist schedule: {}", e);
    }
}

async fn persist_requirements(state: &AppState) {
    let (_saving, requirements) = state.schedule.requirements_for_save().await;
    if let Err(e) = state.repo.save_requirements(&requirements).await {
        tracing::warn!("Failed to persist requirements: {}", e);
    }
}
