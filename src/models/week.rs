//! Weekly template primitives: days, shift types and availability slots.
//!
//! Wire labels follow the shop's own labels (`Thứ 2`, `Sáng`, ...); English
//! names are accepted on input.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

/// A recurring day of the weekly template, not a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Day {
    #[serde(rename = "Thứ 2")]
    Monday,
    #[serde(rename = "Thứ 3")]
    Tuesday,
    #[serde(rename = "Thứ 4")]
    Wednesday,
    #[serde(rename = "Thứ 5")]
    Thursday,
    #[serde(rename = "Thứ 6")]
    Friday,
    #[serde(rename = "Thứ 7")]
    Saturday,
    #[serde(rename = "Chủ Nhật")]
    Sunday,
}

impl Day {
    /// All days in week order.
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Day::Monday => "Thứ 2",
            Day::Tuesday => "Thứ 3",
            Day::Wednesday => "Thứ 4",
            Day::Thursday => "Thứ 5",
            Day::Friday => "Thứ 6",
            Day::Saturday => "Thứ 7",
            Day::Sunday => "Chủ Nhật",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }

    /// Parse a canonical label or an English day name (case-insensitive).
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        Day::ALL
            .into_iter()
            .find(|day| day.label() == s || day.english_name().eq_ignore_ascii_case(s))
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, Day::Saturday | Day::Sunday)
    }
}

// Input goes through `from_label` so bodies accept what path segments accept
impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Day::from_label(&label).ok_or_else(|| de::Error::custom(format!("unknown day '{}'", label)))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the three daily shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ShiftType {
    #[serde(rename = "Sáng")]
    Morning,
    #[serde(rename = "Chiều")]
    Afternoon,
    #[serde(rename = "Tối")]
    Evening,
}

impl ShiftType {
    pub const ALL: [ShiftType; 3] = [ShiftType::Morning, ShiftType::Afternoon, ShiftType::Evening];

    pub fn label(&self) -> &'static str {
        match self {
            ShiftType::Morning => "Sáng",
            ShiftType::Afternoon => "Chiều",
            ShiftType::Evening => "Tối",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            ShiftType::Morning => "Morning",
            ShiftType::Afternoon => "Afternoon",
            ShiftType::Evening => "Evening",
        }
    }

    /// Display-only opening hours of the shift.
    pub fn time_range(&self) -> &'static str {
        match self {
            ShiftType::Morning => "6:00 - 14:00",
            ShiftType::Afternoon => "12:00 - 20:00",
            ShiftType::Evening => "18:00 - 23:00",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        ShiftType::ALL
            .into_iter()
            .find(|shift| shift.label() == s || shift.english_name().eq_ignore_ascii_case(s))
    }
}

impl<'de> Deserialize<'de> for ShiftType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        ShiftType::from_label(&label)
            .ok_or_else(|| de::Error::custom(format!("unknown shift type '{}'", label)))
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A (day, shift) pair a staff member declares as workable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub day: Day,
    pub shift_type: ShiftType,
}

impl AvailabilitySlot {
    pub fn new(day: Day, shift_type: ShiftType) -> Self {
        Self { day, shift_type }
    }
}
