//! Requirement API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{error, parse_cell, persist_requirements, success, ApiResult};
use crate::auth::{Actor, Capability};
use crate::errors::AppError;
use crate::models::{Day, ShiftType, UpdateRequirementRequest};
use crate::scheduling::RequirementMatrix;
use crate::AppState;

/// A stored requirement cell after an edit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementUpdated {
    pub day: Day,
    pub shift_type: ShiftType,
    pub count: u32,
    pub requirements: RequirementMatrix,
}

/// GET /api/requirements - The full weekly requirement matrix.
pub async fn get_requirements(
    State(state): State<AppState>,
    _actor: Actor,
) -> ApiResult<RequirementMatrix> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(state.schedule.requirements().await, revision_id)
}

/// PUT /api/requirements/:day/:shift - Set one cell's headcount.
///
/// Counts below one are stored as one.
pub async fn update_requirement(
    State(state): State<AppState>,
    actor: Actor,
    Path((day, shift)): Path<(String, String)>,
    Json(request): Json<UpdateRequirementRequest>,
) -> ApiResult<RequirementUpdated> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::Admin) {
        return error(e, revision_id);
    }

    let (day, shift) = match parse_cell(&day, &shift) {
        Ok(cell) => cell,
        Err(e) => return error(e, revision_id),
    };

    let Some(count) = request.count.as_i64() else {
        return error(
            AppError::Validation(format!("count must be an integer, got {}", request.count)),
            revision_id,
        );
    };

    match state.schedule.set_requirement(day, shift, count).await {
        Ok((stored, requirements)) => {
            persist_requirements(&state).await;
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(
                RequirementUpdated {
                    day,
                    shift_type: shift,
                    count: stored,
                    requirements,
                },
                new_revision,
            )
        }
        Err(e) => error(e, revision_id),
    }
}
