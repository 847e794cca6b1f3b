//! Database repository for the staff roster and scheduling blobs.
//!
//! Uses prepared statements and conditional updates for data integrity.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{AvailabilitySlot, CreateStaffRequest, RevisionInfo, Role, Staff, UpdateStaffRequest};
use crate::scheduling::{RequirementMatrix, ScheduleStore};

/// Blob name of the weekly requirement matrix.
pub const REQUIREMENTS_BLOB: &str = "coffee_requirements";
/// Blob name of the weekly schedule.
pub const SCHEDULE_BLOB: &str = "coffee_schedule";

const STAFF_COLUMNS: &str =
    "id, name, role, phone, email, avatar, availability, updated_at, version";

/// Schema and revision metadata.
#[derive(Debug, Clone)]
pub struct Meta {
    pub schema_version: i32,
    pub revision_id: i64,
    pub generated_at: String,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    pub async fn get_meta(&self) -> Result<Meta, AppError> {
        let row =
            sqlx::query("SELECT schema_version, revision_id, generated_at FROM meta WHERE id = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(Meta {
            schema_version: row.get("schema_version"),
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== STAFF OPERATIONS ====================

    /// List all staff ordered by name.
    pub async fn list_staff(&self) -> Result<Vec<Staff>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM staff ORDER BY name, id",
            STAFF_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(staff_from_row).collect())
    }

    /// Get a staff member by ID.
    pub async fn get_staff(&self, id: &str) -> Result<Option<Staff>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM staff WHERE id = ?", STAFF_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(staff_from_row))
    }

    /// Number of other staff members sharing a phone number.
    pub async fn count_phone_duplicates(
        &self,
        phone: &str,
        exclude_id: Option<&str>,
    ) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM staff WHERE phone = ? AND id != ?")
            .bind(phone.trim())
            .bind(exclude_id.unwrap_or(""))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Create a new staff member.
    pub async fn create_staff(&self, request: &CreateStaffRequest) -> Result<Staff, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let name = request.name.trim().to_string();
        let phone = request.phone.as_ref().map(|p| p.trim().to_string());
        let availability_json = availability_to_json(&request.availability)?;

        sqlx::query(
            "INSERT INTO staff (id, name, role, phone, email, avatar, availability, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)"
        )
        .bind(&id)
        .bind(&name)
        .bind(request.role.as_str())
        .bind(&phone)
        .bind(&request.email)
        .bind(&request.avatar)
        .bind(&availability_json)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Staff {
            id,
            name,
            role: request.role,
            phone,
            email: request.email.clone(),
            avatar: request.avatar.clone(),
            availability: request.availability.clone(),
            updated_at: now,
            version: 1,
        })
    }

    /// Update a staff member with optimistic concurrency control.
    pub async fn update_staff(
        &self,
        id: &str,
        request: &UpdateStaffRequest,
    ) -> Result<Staff, AppError> {
        let existing = self
            .get_staff(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Staff {} not found", id)))?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let updated = Staff {
            id: existing.id.clone(),
            name: request
                .name
                .as_ref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| existing.name.clone()),
            role: request.role.unwrap_or(existing.role),
            phone: request
                .phone
                .as_ref()
                .map(|p| p.trim().to_string())
                .or(existing.phone.clone()),
            email: request.email.clone().or(existing.email.clone()),
            avatar: request.avatar.clone().or(existing.avatar.clone()),
            availability: request
                .availability
                .clone()
                .unwrap_or_else(|| existing.availability.clone()),
            updated_at: Utc::now().to_rfc3339(),
            version: existing.version + 1,
        };

        self.write_staff(&updated, existing.version).await
    }

    /// Replace a staff member's availability set.
    pub async fn set_availability(
        &self,
        id: &str,
        availability: BTreeSet<AvailabilitySlot>,
    ) -> Result<Staff, AppError> {
        let existing = self
            .get_staff(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Staff {} not found", id)))?;
        let current_version = existing.version;

        let updated = Staff {
            availability,
            updated_at: Utc::now().to_rfc3339(),
            version: current_version + 1,
            ..existing
        };
        self.write_staff(&updated, current_version).await
    }

    /// Flip one availability slot on or off.
    pub async fn toggle_availability(
        &self,
        id: &str,
        slot: AvailabilitySlot,
    ) -> Result<Staff, AppError> {
        let existing = self
            .get_staff(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Staff {} not found", id)))?;

        let mut availability = existing.availability.clone();
        if !availability.remove(&slot) {
            availability.insert(slot);
        }
        self.set_availability(id, availability).await
    }

    /// Delete a staff member.
    pub async fn delete_staff(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM staff WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Staff {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Conditional write guarded by the version the caller read.
    async fn write_staff(&self, staff: &Staff, read_version: i64) -> Result<Staff, AppError> {
        let availability_json = availability_to_json(&staff.availability)?;

        // Use conditional UPDATE with version check to prevent race conditions
        let result = sqlx::query(
            "UPDATE staff SET name = ?, role = ?, phone = ?, email = ?, avatar = ?, availability = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?"
        )
        .bind(&staff.name)
        .bind(staff.role.as_str())
        .bind(&staff.phone)
        .bind(&staff.email)
        .bind(&staff.avatar)
        .bind(&availability_json)
        .bind(&staff.updated_at)
        .bind(staff.version)
        .bind(&staff.id)
        .bind(read_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Race condition - version changed between read and write
            let current = self.get_staff(&staff.id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|s| s.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;
        Ok(staff.clone())
    }

    // ==================== BLOB OPERATIONS ====================

    /// Load a named blob. `Ok(None)` when it was never saved.
    pub async fn load_blob<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        let row = sqlx::query("SELECT payload FROM blobs WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let payload: String = row.get("payload");
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    /// Store a named blob, replacing any previous value.
    pub async fn save_blob<T: Serialize>(&self, name: &str, value: &T) -> Result<(), AppError> {
        let payload = serde_json::to_string(value)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO blobs (name, payload, updated_at) VALUES (?, ?, ?) ON CONFLICT(name) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at"
        )
        .bind(name)
        .bind(&payload)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(())
    }

    /// Stored requirements, or the default policy if missing or unreadable.
    pub async fn load_requirements(&self) -> RequirementMatrix {
        self.load_or_default(REQUIREMENTS_BLOB).await
    }

    pub async fn save_requirements(&self, requirements: &RequirementMatrix) -> Result<(), AppError> {
        self.save_blob(REQUIREMENTS_BLOB, requirements).await
    }

    /// Stored schedule, or an empty schedule if missing or unreadable.
    pub async fn load_schedule(&self) -> ScheduleStore {
        self.load_or_default(SCHEDULE_BLOB).await
    }

    pub async fn save_schedule(&self, schedule: &ScheduleStore) -> Result<(), AppError> {
        self.save_blob(SCHEDULE_BLOB, schedule).await
    }

    async fn load_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.load_blob(name).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!("Failed to load {}, using default: {}", name, e);
                T::default()
            }
        }
    }
}

// Helper functions for row conversion

fn staff_from_row(row: &sqlx::sqlite::SqliteRow) -> Staff {
    let role_str: String = row.get("role");
    let availability_str: String = row.get("availability");
    let id: String = row.get("id");

    let role = Role::from_label(&role_str).unwrap_or_else(|| {
        tracing::warn!("Unknown role '{}' for staff {}, treating as server", role_str, id);
        Role::Server
    });

    Staff {
        id,
        name: row.get("name"),
        role,
        phone: row.get("phone"),
        email: row.get("email"),
        avatar: row.get("avatar"),
        availability: serde_json::from_str(&availability_str).unwrap_or_default(),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn availability_to_json(availability: &BTreeSet<AvailabilitySlot>) -> Result<String, AppError> {
    serde_json::to_string(availability).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::{Day, Shift, ShiftType, StaffRef};
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn create_request(name: &str) -> CreateStaffRequest {
        CreateStaffRequest {
            name: name.to_string(),
            role: Role::Barista,
            phone: Some("0901234567".to_string()),
            email: None,
            avatar: None,
            availability: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_blobs_load_defaults() {
        let (repo, _dir) = repo().await;
        assert_eq!(repo.load_requirements().await, RequirementMatrix::default());
        assert!(repo.load_schedule().await.is_empty());
    }

    #[tokio::test]
    async fn test_blobs_round_trip() {
        let (repo, _dir) = repo().await;
        let mut requirements = RequirementMatrix::default();
        requirements.set(Day::Thursday, ShiftType::Evening, 5).unwrap();
        repo.save_requirements(&requirements).await.unwrap();

        let schedule = ScheduleStore::from_shifts(vec![Shift {
            id: "x".to_string(),
            day: Day::Thursday,
            shift_type: ShiftType::Evening,
            staff_ids: vec![StaffRef::from("a")],
        }])
        .unwrap();
        repo.save_schedule(&schedule).await.unwrap();
        repo.save_schedule(&schedule).await.unwrap();

        assert_eq!(repo.load_requirements().await, requirements);
        assert_eq!(repo.load_schedule().await, schedule);
    }

    #[tokio::test]
    async fn test_corrupt_blob_falls_back_to_default() {
        let (repo, _dir) = repo().await;
        repo.save_blob(SCHEDULE_BLOB, &serde_json::json!({"not": "a list"}))
            .await
            .unwrap();
        assert!(repo.load_schedule().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_availability_is_involution() {
        let (repo, _dir) = repo().await;
        let staff = repo.create_staff(&create_request("Lan")).await.unwrap();
        let slot = AvailabilitySlot::new(Day::Monday, ShiftType::Morning);

        let on = repo.toggle_availability(&staff.id, slot).await.unwrap();
        assert!(on.is_available(&slot));
        assert_eq!(on.version, 2);

        let off = repo.toggle_availability(&staff.id, slot).await.unwrap();
        assert!(!off.is_available(&slot));
        assert_eq!(off.version, 3);
    }

    #[tokio::test]
    async fn test_update_version_conflict() {
        let (repo, _dir) = repo().await;
        let staff = repo.create_staff(&create_request("Minh")).await.unwrap();
        let request = UpdateStaffRequest {
            name: Some("Minh Anh".to_string()),
            expected_version: Some(7),
            ..Default::default()
        };
        let result = repo.update_staff(&staff.id, &request).await;
        assert!(matches!(result, Err(AppError::Conflict { current_version: 1, .. })));
    }

    #[tokio::test]
    async fn test_phone_duplicates_counted() {
        let (repo, _dir) = repo().await;
        let first = repo.create_staff(&create_request("A")).await.unwrap();
        assert_eq!(
            repo.count_phone_duplicates("0901234567", Some(&first.id))
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            repo.count_phone_duplicates("0901234567", None).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_missing_staff_is_not_found() {
        let (repo, _dir) = repo().await;
        let result = repo.delete_staff("nobody").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
