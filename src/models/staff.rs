//! Staff model: roster entries and their declared availability.

use std::collections::BTreeSet;

use serde::{de, Deserialize, Deserializer, Serialize};

use super::{AvailabilitySlot, ShiftType};

/// Job role of a staff member.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "Quản lý")]
    Manager,
    #[serde(rename = "Pha chế")]
    Barista,
    #[serde(rename = "Phục vụ")]
    Server,
    #[serde(rename = "Tạp vụ")]
    Cleaner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "Quản lý",
            Role::Barista => "Pha chế",
            Role::Server => "Phục vụ",
            Role::Cleaner => "Tạp vụ",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Quản lý" => Some(Role::Manager),
            "Pha chế" => Some(Role::Barista),
            "Phục vụ" => Some(Role::Server),
            "Tạp vụ" => Some(Role::Cleaner),
            other if other.eq_ignore_ascii_case("manager") => Some(Role::Manager),
            other if other.eq_ignore_ascii_case("barista") => Some(Role::Barista),
            other if other.eq_ignore_ascii_case("server") => Some(Role::Server),
            other if other.eq_ignore_ascii_case("cleaner") => Some(Role::Cleaner),
            _ => None,
        }
    }

    /// Whether this role is preferred when staffing the given shift.
    ///
    /// Baristas are preferred for the morning and evening rush.
    pub fn preferred_for(&self, shift: ShiftType) -> bool {
        matches!(
            (self, shift),
            (Role::Barista, ShiftType::Morning) | (Role::Barista, ShiftType::Evening)
        )
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Role::from_label(&label).ok_or_else(|| de::Error::custom(format!("unknown role '{}'", label)))
    }
}

/// A member of the shop's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub availability: BTreeSet<AvailabilitySlot>,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl Staff {
    pub fn is_available(&self, slot: &AvailabilitySlot) -> bool {
        self.availability.contains(slot)
    }
}

/// Request body for creating a new staff member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub availability: BTreeSet<AvailabilitySlot>,
}

fn default_role() -> Role {
    Role::Server
}

/// Request body for updating an existing staff member.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub availability: Option<BTreeSet<AvailabilitySlot>>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body replacing a staff member's whole availability set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAvailabilityRequest {
    pub availability: BTreeSet<AvailabilitySlot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::from_label("Pha chế"), Some(Role::Barista));
        assert_eq!(Role::from_label("barista"), Some(Role::Barista));
        assert_eq!(Role::from_label("Chef"), None);
        assert_eq!(Role::from_label(Role::Cleaner.as_str()), Some(Role::Cleaner));
    }

    #[test]
    fn test_barista_preferred_for_rush_shifts() {
        assert!(Role::Barista.preferred_for(ShiftType::Morning));
        assert!(Role::Barista.preferred_for(ShiftType::Evening));
        assert!(!Role::Barista.preferred_for(ShiftType::Afternoon));
        assert!(!Role::Server.preferred_for(ShiftType::Morning));
    }

    #[test]
    fn test_availability_deduplicates_on_deserialize() {
        let request: CreateStaffRequest = serde_json::from_str(
            r#"{
                "name": "Lan",
                "availability": [
                    {"day": "Thứ 2", "shiftType": "Sáng"},
                    {"day": "Monday", "shiftType": "Morning"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(request.availability.len(), 1);
        assert_eq!(request.role, Role::Server);
    }

    #[test]
    fn test_role_deserialize_is_case_insensitive() {
        let role: Role = serde_json::from_str("\"barista\"").unwrap();
        assert_eq!(role, Role::Barista);
        assert!(serde_json::from_str::<Role>("\"Chef\"").is_err());
    }
}
