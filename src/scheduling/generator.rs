//! Contract between the scheduler and whatever produces candidate schedules.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{RequirementMatrix, ScheduleStore};
use crate::models::{AvailabilitySlot, RawShift, Role, Shift, Staff};

/// Advisory goals sent along with every request. Generators may ignore them;
/// only the structural contract is enforced on their output.
pub const GUIDELINES: [&str; 4] = [
    "Only assign staff to slots they declared as available.",
    "Meet the exact required headcount of every shift where possible.",
    "When not enough staff are available, assign as many as possible without exceeding the requirement.",
    "Prefer Baristas for morning and evening shifts.",
];

/// Staff fields a generator needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorStaff {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub availability: BTreeSet<AvailabilitySlot>,
}

impl From<&Staff> for GeneratorStaff {
    fn from(staff: &Staff) -> Self {
        Self {
            id: staff.id.clone(),
            name: staff.name.clone(),
            role: staff.role,
            availability: staff.availability.clone(),
        }
    }
}

/// Input handed to a generator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub staff: Vec<GeneratorStaff>,
    pub existing_schedule: Vec<Shift>,
    pub requirements: RequirementMatrix,
    pub guidelines: Vec<String>,
}

impl GenerationRequest {
    pub fn new(roster: &[Staff], existing: &ScheduleStore, requirements: &RequirementMatrix) -> Self {
        Self {
            staff: roster.iter().map(GeneratorStaff::from).collect(),
            existing_schedule: existing.to_vec(),
            requirements: requirements.clone(),
            guidelines: GUIDELINES.iter().map(|g| g.to_string()).collect(),
        }
    }
}

/// Why a generator could not produce a usable result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// Network or connection failure
    Transport(String),
    /// Remote answered with a non-success status
    Status(u16),
    /// No answer within the allowed time
    Timeout(Duration),
    /// Answer could not be parsed as a shift list
    Malformed(String),
    /// Answer contained no shifts
    Empty,
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::Transport(msg) => write!(f, "transport error: {}", msg),
            GeneratorError::Status(code) => write!(f, "generator returned status {}", code),
            GeneratorError::Timeout(after) => {
                write!(f, "generator timed out after {}s", after.as_secs())
            }
            GeneratorError::Malformed(msg) => write!(f, "malformed generator output: {}", msg),
            GeneratorError::Empty => f.write_str("generator returned no shifts"),
        }
    }
}

impl std::error::Error for GeneratorError {}

/// Produces a candidate weekly schedule.
///
/// Implementations may be remote and non-deterministic; the scheduler only
/// trusts their output after validation.
#[async_trait]
pub trait ScheduleGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<RawShift>, GeneratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, ShiftType};

    #[test]
    fn test_request_carries_complete_requirements() {
        let staff = Staff {
            id: "s1".to_string(),
            name: "Lan".to_string(),
            role: Role::Barista,
            phone: Some("0901".to_string()),
            email: None,
            avatar: None,
            availability: [AvailabilitySlot::new(Day::Monday, ShiftType::Morning)]
                .into_iter()
                .collect(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            version: 1,
        };
        let request = GenerationRequest::new(
            &[staff],
            &ScheduleStore::new(),
            &RequirementMatrix::default(),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["requirements"].as_object().unwrap().len(), 7);
        assert_eq!(json["staff"][0]["role"], "Pha chế");
        assert_eq!(json["staff"][0]["availability"][0]["day"], "Thứ 2");
        // Contact details are not shared with the generator
        assert!(json["staff"][0].get("phone").is_none());
        assert_eq!(json["existingSchedule"].as_array().unwrap().len(), 0);
        assert_eq!(json["guidelines"].as_array().unwrap().len(), GUIDELINES.len());
    }
}
