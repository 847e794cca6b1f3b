//! Staff API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{error, persist_schedule, success, ApiResult};
use crate::auth::{Actor, Capability};
use crate::errors::AppError;
use crate::models::{
    AvailabilitySlot, CreateStaffRequest, SetAvailabilityRequest, Staff, UpdateStaffRequest,
};
use crate::AppState;

/// Result of deleting a staff member.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedStaff {
    pub id: String,
    pub removed_from_shifts: usize,
}

/// GET /api/staff - List all staff.
pub async fn list_staff(State(state): State<AppState>, _actor: Actor) -> ApiResult<Vec<Staff>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_staff().await {
        Ok(staff) => success(staff, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/staff/:id - Get a single staff member.
pub async fn get_staff(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Staff> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_staff(&id).await {
        Ok(Some(staff)) => success(staff, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Staff {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/staff - Create a new staff member.
pub async fn create_staff(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateStaffRequest>,
) -> ApiResult<Staff> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::Admin) {
        return error(e, revision_id);
    }

    // Validate required fields
    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Name is required".to_string()),
            revision_id,
        );
    }

    if let Some(phone) = &request.phone {
        warn_duplicate_phone(&state, phone, None).await;
    }

    match state.repo.create_staff(&request).await {
        Ok(staff) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(staff, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/staff/:id - Update a staff member.
pub async fn update_staff(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(request): Json<UpdateStaffRequest>,
) -> ApiResult<Staff> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::AdminOrSelf(&id)) {
        return error(e, revision_id);
    }

    if request.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
        return error(
            AppError::Validation("Name cannot be empty".to_string()),
            revision_id,
        );
    }

    if !actor.is_admin() {
        if let Some(role) = request.role {
            match state.repo.get_staff(&id).await {
                Ok(Some(existing)) if existing.role != role => {
                    return error(
                        AppError::Forbidden("Only an admin can change a role".to_string()),
                        revision_id,
                    );
                }
                Ok(_) => {}
                Err(e) => return error(e, revision_id),
            }
        }
    }

    if let Some(phone) = &request.phone {
        warn_duplicate_phone(&state, phone, Some(&id)).await;
    }

    match state.repo.update_staff(&id, &request).await {
        Ok(staff) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(staff, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/staff/:id - Delete a staff member and unassign them everywhere.
pub async fn delete_staff(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<DeletedStaff> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::Admin) {
        return error(e, revision_id);
    }

    if let Err(e) = state.repo.delete_staff(&id).await {
        return error(e, revision_id);
    }

    let removed_from_shifts = state.schedule.on_staff_deleted(&id).await;
    if removed_from_shifts > 0 {
        persist_schedule(&state).await;
    }

    let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
    success(
        DeletedStaff {
            id,
            removed_from_shifts,
        },
        new_revision,
    )
}

/// PUT /api/staff/:id/availability - Replace the availability set.
pub async fn set_availability(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(request): Json<SetAvailabilityRequest>,
) -> ApiResult<Staff> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::AdminOrSelf(&id)) {
        return error(e, revision_id);
    }

    match state.repo.set_availability(&id, request.availability).await {
        Ok(staff) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(staff, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/staff/:id/availability/toggle - Flip one availability slot.
pub async fn toggle_availability(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(slot): Json<AvailabilitySlot>,
) -> ApiResult<Staff> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = actor.require(Capability::AdminOrSelf(&id)) {
        return error(e, revision_id);
    }

    match state.repo.toggle_availability(&id, slot).await {
        Ok(staff) => {
            tracing::debug!(
                "Staff {} {} for {} {}",
                id,
                if staff.is_available(&slot) { "available" } else { "unavailable" },
                slot.day,
                slot.shift_type
            );
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(staff, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

async fn warn_duplicate_phone(state: &AppState, phone: &str, exclude_id: Option<&str>) {
    match state.repo.count_phone_duplicates(phone, exclude_id).await {
        Ok(0) => {}
        Ok(n) => tracing::warn!("Phone number {} already used by {} staff member(s)", phone, n),
        Err(e) => tracing::warn!("Could not check phone duplicates: {}", e),
    }
}
