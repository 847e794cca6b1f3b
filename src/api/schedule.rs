//! Schedule API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{error, parse_cell, persist_schedule, success, ApiResult};
use crate::auth::{Actor, Capability};
use crate::errors::AppError;
use crate::models::{AssignStaffRequest, AvailabilitySlot, Day, Shift, ShiftType};
use crate::scheduling::{summarize, Coverage, CoverageSummary, GenerationOutcome, GridCell};
use crate::AppState;

/// The weekly grid with its aggregate coverage.
#[derive(Debug, Serialize)]
pub struct WeeklyGrid {
    pub cells: Vec<GridCell>,
    pub summary: CoverageSummary,
}

/// One cell with its coverage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDetail {
    pub day: Day,
    pub shift_type: ShiftType,
    pub time_range: &'static str,
    pub shift: Option<Shift>,
    pub coverage: Coverage,
}

/// Result of a manual assignment change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentChange {
    pub changed: bool,
    pub shift: Option<Shift>,
}

/// GET /api/schedule - All scheduled cells in week order.
pub async fn get_schedule(State(state): State<AppState>, _actor: Actor) -> ApiResult<Vec<Shift>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(state.schedule.schedule().await.to_vec(), revision_id)
}

/// GET /api/schedule/grid - The 21-cell weekly grid.
///
/// For a staff actor, cells they work are flagged with `isMine`.
pub async fn get_grid(State(state): State<AppState>, actor: Actor) -> ApiResult<WeeklyGrid> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let roster = match state.repo.list_staff().await {
        Ok(roster) => roster,
        Err(e) => return error(e, revision_id),
    };

    let cells = state.schedule.grid(&roster, actor.staff_id()).await;
    let summary = summarize(&cells);
    success(WeeklyGrid { cells, summary }, revision_id)
}

/// GET /api/schedule/:day/:shift - One cell and its coverage.
///
/// Ids no longer on the roster are left out, as in the grid.
pub async fn get_cell(
    State(state): State<AppState>,
    _actor: Actor,
    Path((day, shift)): Path<(String, String)>,
) -> ApiResult<CellDetail> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let (day, shift) = match parse_cell(&day, &shift) {
        Ok(cell) => cell,
        Err(e) => return error(e, revision_id),
    };

    let roster = match state.repo.list_staff().await {
        Ok(roster) => roster,
        Err(e) => return error(e, revision_id),
    };

    let (cell, coverage) = state.schedule.cell(day, shift, &roster).await;
    success(
        CellDetail {
            day,
            shift_type: shift,
            time_range: shift.time_range(),
            shift: cell,
            coverage,
        },
        revision_id,
    )
}

/// POST /api/schedule/generate - Replace the schedule with a generated one.
pub async fn generate_schedule(
    State(state): State<AppState>,
    actor: Actor,
) -> ApiResult<GenerationOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::Admin) {
        return error(e, revision_id);
    }

    let repo = state.repo.clone();
    let load_roster = move || {
        let repo = repo.clone();
        async move { repo.list_staff().await }
    };

    match state.schedule.regenerate(load_roster).await {
        Ok(outcome) => {
            persist_schedule(&state).await;
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(outcome, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/schedule/:day/:shift/assignments - Manually assign a staff member.
pub async fn assign_staff(
    State(state): State<AppState>,
    actor: Actor,
    Path((day, shift)): Path<(String, String)>,
    Json(request): Json<AssignStaffRequest>,
) -> ApiResult<AssignmentChange> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::Admin) {
        return error(e, revision_id);
    }

    let (day, shift) = match parse_cell(&day, &shift) {
        Ok(cell) => cell,
        Err(e) => return error(e, revision_id),
    };

    let staff_id = request.staff_id.trim();
    let staff = match state.repo.get_staff(staff_id).await {
        Ok(Some(staff)) => staff,
        Ok(None) => {
            return error(
                AppError::NotFound(format!("Staff {} not found", staff_id)),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    if !staff.is_available(&AvailabilitySlot::new(day, shift)) {
        tracing::warn!(
            "Assigning {} to {} {} outside their availability",
            staff.id,
            day,
            shift
        );
    }

    let (changed, schedule) = state.schedule.assign(day, shift, &staff.id).await;
    if changed {
        persist_schedule(&state).await;
    }

    let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
    success(
        AssignmentChange {
            changed,
            shift: schedule.find_cell(day, shift).cloned(),
        },
        new_revision,
    )
}

/// DELETE /api/schedule/:day/:shift/assignments/:staff_id - Remove one assignment.
pub async fn unassign_staff(
    State(state): State<AppState>,
    actor: Actor,
    Path((day, shift, staff_id)): Path<(String, String, String)>,
) -> ApiResult<AssignmentChange> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::Admin) {
        return error(e, revision_id);
    }

    let (day, shift) = match parse_cell(&day, &shift) {
        Ok(cell) => cell,
        Err(e) => return error(e, revision_id),
    };

    let (changed, schedule) = state.schedule.unassign(day, shift, &staff_id).await;
    if changed {
        persist_schedule(&state).await;
    }

    let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
    success(
        AssignmentChange {
            changed,
            shift: schedule.find_cell(day, shift).cloned(),
        },
        new_revision,
    )
}
