//! Shift assignment cells and the raw records produced by schedule generators.

use serde::{Deserialize, Serialize};

use super::{Day, ShiftType, Staff};

/// Weak reference to a staff member by id.
///
/// The referenced staff member may have been deleted; callers resolve it
/// against the current roster and treat a miss as unknown staff.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffRef(String);

impl StaffRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resolve<'a>(&self, roster: &'a [Staff]) -> Option<&'a Staff> {
        roster.iter().find(|s| s.id == self.0)
    }
}

impl From<&str> for StaffRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One (day, shift) cell of the weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub day: Day,
    pub shift_type: ShiftType,
    #[serde(default)]
    pub staff_ids: Vec<StaffRef>,
}

impl Shift {
    /// Create an empty cell with a fresh id.
    pub fn empty(day: Day, shift_type: ShiftType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            day,
            shift_type,
            staff_ids: Vec::new(),
        }
    }

    pub fn key(&self) -> (Day, ShiftType) {
        (self.day, self.shift_type)
    }

    pub fn contains(&self, staff_id: &str) -> bool {
        self.staff_ids.iter().any(|s| s.as_str() == staff_id)
    }
}

/// A shift record exactly as returned by a generator, before validation.
///
/// Labels are kept as strings so that unknown values can be reported rather
/// than failing deserialization of the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShift {
    #[serde(default)]
    pub id: Option<String>,
    pub day: String,
    pub shift_type: String,
    #[serde(default)]
    pub staff_ids: Vec<String>,
}

/// Request body for a manual assignment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignStaffRequest {
    pub staff_id: String,
}

/// Request body for editing one requirement cell.
///
/// The count is kept as a raw JSON value so non-integer input surfaces as a
/// validation error in the response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequirementRequest {
    pub count: serde_json::Value,
}
