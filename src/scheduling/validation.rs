//! Structural validation of generator output before it reaches the store.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::GeneratorError;
use crate::errors::AppError;
use crate::models::{Day, RawShift, Shift, ShiftType, Staff, StaffRef};

/// Generator output that passed validation, with what was cleaned up.
#[derive(Debug, Clone)]
pub struct ValidatedSchedule {
    pub shifts: Vec<Shift>,
    /// Ids that did not match anyone on the roster, sorted.
    pub dropped_staff_ids: Vec<String>,
    /// Number of repeated ids removed inside single cells.
    pub collapsed_duplicates: usize,
}

/// Check raw generator records against the roster.
///
/// The batch is rejected as a whole when any record names an unknown day or
/// shift, or when two records target the same cell. Unknown staff ids are
/// dropped and repeated ids within a cell collapsed. An empty batch counts
/// as a generation failure.
pub fn validate_generated(raw: Vec<RawShift>, roster: &[Staff]) -> Result<ValidatedSchedule, AppError> {
    if raw.is_empty() {
        return Err(GeneratorError::Empty.into());
    }

    let known: HashSet<&str> = roster.iter().map(|s| s.id.as_str()).collect();
    let mut seen_cells: HashMap<(Day, ShiftType), usize> = HashMap::new();
    let mut dropped = BTreeSet::new();
    let mut collapsed_duplicates = 0;
    let mut shifts = Vec::with_capacity(raw.len());

    for (index, record) in raw.into_iter().enumerate() {
        let day = Day::from_label(&record.day).ok_or_else(|| {
            AppError::Validation(format!(
                "Generated shift #{} has unknown day '{}'",
                index, record.day
            ))
        })?;
        let shift_type = ShiftType::from_label(&record.shift_type).ok_or_else(|| {
            AppError::Validation(format!(
                "Generated shift #{} has unknown shift type '{}'",
                index, record.shift_type
            ))
        })?;

        if let Some(first) = seen_cells.insert((day, shift_type), index) {
            return Err(AppError::Validation(format!(
                "Generated shifts #{} and #{} both target {} {}",
                first, index, day, shift_type
            )));
        }

        let mut staff_ids: Vec<StaffRef> = Vec::with_capacity(record.staff_ids.len());
        for id in record.staff_ids {
            let id = id.trim();
            if !known.contains(id) {
                dropped.insert(id.to_string());
                continue;
            }
            if staff_ids.iter().any(|s| s.as_str() == id) {
                collapsed_duplicates += 1;
                continue;
            }
            staff_ids.push(StaffRef::new(id));
        }

        shifts.push(Shift {
            id: record
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            day,
            shift_type,
            staff_ids,
        });
    }

    if !dropped.is_empty() {
        tracing::warn!(
            "Dropped {} unknown staff id(s) from generated schedule",
            dropped.len()
        );
    }

    Ok(ValidatedSchedule {
        shifts,
        dropped_staff_ids: dropped.into_iter().collect(),
        collapsed_duplicates,
    })
}
