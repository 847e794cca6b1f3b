//! Per-day, per-shift required headcount.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Day, ShiftType};

/// Lowest headcount a cell may require.
pub const MIN_HEADCOUNT: u32 = 1;
/// Default headcount for Monday to Friday shifts.
pub const WEEKDAY_HEADCOUNT: u32 = 2;
/// Default headcount for Saturday and Sunday shifts.
pub const WEEKEND_HEADCOUNT: u32 = 3;

/// Required headcount for each shift of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyRequirement {
    pub morning: u32,
    pub afternoon: u32,
    pub evening: u32,
}

/// A day as found in a stored blob; any shift may be missing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StoredDailyRequirement {
    morning: Option<u32>,
    afternoon: Option<u32>,
    evening: Option<u32>,
}

impl StoredDailyRequirement {
    /// Missing shifts take the day's default policy.
    fn resolve(self, day: Day) -> DailyRequirement {
        let fallback = DailyRequirement::default_for(day);
        DailyRequirement {
            morning: self.morning.unwrap_or(fallback.morning),
            afternoon: self.afternoon.unwrap_or(fallback.afternoon),
            evening: self.evening.unwrap_or(fallback.evening),
        }
        .normalized()
    }
}

impl DailyRequirement {
    pub fn uniform(count: u32) -> Self {
        Self {
            morning: count,
            afternoon: count,
            evening: count,
        }
    }

    /// Default policy: weekends are busier.
    pub fn default_for(day: Day) -> Self {
        if day.is_weekend() {
            Self::uniform(WEEKEND_HEADCOUNT)
        } else {
            Self::uniform(WEEKDAY_HEADCOUNT)
        }
    }

    pub fn get(&self, shift: ShiftType) -> u32 {
        match shift {
            ShiftType::Morning => self.morning,
            ShiftType::Afternoon => self.afternoon,
            ShiftType::Evening => self.evening,
        }
    }

    fn slot_mut(&mut self, shift: ShiftType) -> &mut u32 {
        match shift {
            ShiftType::Morning => &mut self.morning,
            ShiftType::Afternoon => &mut self.afternoon,
            ShiftType::Evening => &mut self.evening,
        }
    }

    fn normalized(self) -> Self {
        Self {
            morning: self.morning.max(MIN_HEADCOUNT),
            afternoon: self.afternoon.max(MIN_HEADCOUNT),
            evening: self.evening.max(MIN_HEADCOUNT),
        }
    }
}

/// Weekly requirement matrix, always populated for all seven days.
///
/// Serialized as a map keyed by day label. Deserializing a partial map fills
/// missing days and missing shifts from the default policy and raises counts
/// below the minimum, so a stored matrix can never violate the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Day, StoredDailyRequirement>",
    into = "BTreeMap<Day, DailyRequirement>"
)]
pub struct RequirementMatrix {
    days: [DailyRequirement; 7],
}

impl Default for RequirementMatrix {
    fn default() -> Self {
        Self {
            days: Day::ALL.map(DailyRequirement::default_for),
        }
    }
}

impl RequirementMatrix {
    pub fn get(&self, day: Day, shift: ShiftType) -> u32 {
        self.days[day as usize].get(shift)
    }

    pub fn daily(&self, day: Day) -> DailyRequirement {
        self.days[day as usize]
    }

    /// Set the headcount for one cell and return the stored value.
    ///
    /// Counts below the minimum, including negatives, are raised to it.
    pub fn set(&mut self, day: Day, shift: ShiftType, count: i64) -> Result<u32, AppError> {
        let clamped = count.max(i64::from(MIN_HEADCOUNT));
        let value = u32::try_from(clamped).map_err(|_| {
            AppError::Validation(format!("Headcount {} is out of range", count))
        })?;
        *self.days[day as usize].slot_mut(shift) = value;
        Ok(value)
    }

    /// Iterate over every day in week order.
    pub fn iter(&self) -> impl Iterator<Item = (Day, DailyRequirement)> + '_ {
        Day::ALL.into_iter().map(|day| (day, self.daily(day)))
    }

    /// Total headcount required over the whole week.
    pub fn total_required(&self) -> u64 {
        self.iter()
            .flat_map(|(_, daily)| ShiftType::ALL.map(|shift| u64::from(daily.get(shift))))
            .sum()
    }
}

impl From<BTreeMap<Day, StoredDailyRequirement>> for RequirementMatrix {
    fn from(stored: BTreeMap<Day, StoredDailyRequirement>) -> Self {
        let mut matrix = Self::default();
        for (day, daily) in stored {
            matrix.days[day as usize] = daily.resolve(day);
        }
        matrix
    }
}

impl From<RequirementMatrix> for BTreeMap<Day, DailyRequirement> {
    fn from(matrix: RequirementMatrix) -> Self {
        matrix.iter().collect()
    }
}
