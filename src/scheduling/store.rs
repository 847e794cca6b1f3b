//! Authoritative in-memory weekly schedule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Day, Shift, ShiftType, StaffRef};

/// Schedule keyed by (day, shift); at most one cell per key.
///
/// An absent cell means nothing has been scheduled there yet, which is
/// distinct from a present cell with nobody assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Shift>", into = "Vec<Shift>")]
pub struct ScheduleStore {
    cells: BTreeMap<(Day, ShiftType), Shift>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a shift list, rejecting duplicate cells.
    ///
    /// Duplicate staff ids inside a cell are collapsed, keeping first occurrence.
    pub fn from_shifts(shifts: Vec<Shift>) -> Result<Self, AppError> {
        let mut cells = BTreeMap::new();
        for mut shift in shifts {
            dedup_in_place(&mut shift.staff_ids);
            let key = shift.key();
            if cells.insert(key, shift).is_some() {
                return Err(AppError::Validation(format!(
                    "Duplicate schedule cell {} {}",
                    key.0, key.1
                )));
            }
        }
        Ok(Self { cells })
    }

    /// Swap the whole schedule. Nothing changes if the new list is invalid.
    pub fn replace_all(&mut self, shifts: Vec<Shift>) -> Result<(), AppError> {
        *self = Self::from_shifts(shifts)?;
        Ok(())
    }

    pub fn find_cell(&self, day: Day, shift: ShiftType) -> Option<&Shift> {
        self.cells.get(&(day, shift))
    }

    /// Remove a staff id from every cell and return how many cells changed.
    pub fn remove_staff(&mut self, staff_id: &str) -> usize {
        let mut touched = 0;
        for shift in self.cells.values_mut() {
            let before = shift.staff_ids.len();
            shift.staff_ids.retain(|s| s.as_str() != staff_id);
            if shift.staff_ids.len() != before {
                touched += 1;
            }
        }
        touched
    }

    /// Assign a staff member to a cell, creating the cell if needed.
    ///
    /// Returns `false` when the staff member was already assigned there.
    pub fn add_assignment(&mut self, day: Day, shift: ShiftType, staff_id: &str) -> bool {
        let cell = self
            .cells
            .entry((day, shift))
            .or_insert_with(|| Shift::empty(day, shift));
        if cell.contains(staff_id) {
            return false;
        }
        cell.staff_ids.push(StaffRef::new(staff_id));
        true
    }

    /// Unassign a staff member. The cell stays, possibly empty.
    pub fn remove_assignment(&mut self, day: Day, shift: ShiftType, staff_id: &str) -> bool {
        match self.cells.get_mut(&(day, shift)) {
            Some(cell) => {
                let before = cell.staff_ids.len();
                cell.staff_ids.retain(|s| s.as_str() != staff_id);
                cell.staff_ids.len() != before
            }
            None => false,
        }
    }

    /// Cells in week order, morning first.
    pub fn shifts(&self) -> impl Iterator<Item = &Shift> {
        self.cells.values()
    }

    pub fn to_vec(&self) -> Vec<Shift> {
        self.cells.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl TryFrom<Vec<Shift>> for ScheduleStore {
    type Error = AppError;

    fn try_from(shifts: Vec<Shift>) -> Result<Self, Self::Error> {
        Self::from_shifts(shifts)
    }
}

impl From<ScheduleStore> for Vec<Shift> {
    fn from(store: ScheduleStore) -> Self {
        store.cells.into_values().collect()
    }
}

fn dedup_in_place(ids: &mut Vec<StaffRef>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(day: Day, shift_type: ShiftType, ids: &[&str]) -> Shift {
        Shift {
            id: format!("{}-{}", day.english_name(), shift_type.english_name()),
            day,
            shift_type,
            staff_ids: ids.iter().map(|id| StaffRef::from(*id)).collect(),
        }
    }

    #[test]
    fn test_replace_all_returns_exactly_supplied_cells() {
        let mut store = ScheduleStore::new();
        store
            .replace_all(vec![
                shift(Day::Monday, ShiftType::Morning, &["a"]),
                shift(Day::Tuesday, ShiftType::Evening, &["b"]),
            ])
            .unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.find_cell(Day::Monday, ShiftType::Morning).is_some());
        assert!(store.find_cell(Day::Tuesday, ShiftType::Evening).is_some());
        assert!(store.find_cell(Day::Monday, ShiftType::Evening).is_none());

        store
            .replace_all(vec![shift(Day::Friday, ShiftType::Afternoon, &["c"])])
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.find_cell(Day::Monday, ShiftType::Morning).is_none());
        assert!(store.find_cell(Day::Friday, ShiftType::Afternoon).is_some());
    }

    #[test]
    fn test_replace_all_rejects_duplicates_and_keeps_previous() {
        let mut store = ScheduleStore::new();
        store
            .replace_all(vec![shift(Day::Monday, ShiftType::Morning, &["a"])])
            .unwrap();
        let result = store.replace_all(vec![
            shift(Day::Sunday, ShiftType::Morning, &["a"]),
            shift(Day::Sunday, ShiftType::Morning, &["b"]),
        ]);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.len(), 1);
        assert!(store.find_cell(Day::Monday, ShiftType::Morning).is_some());
    }

    #[test]
    fn test_remove_staff_cascades_and_is_idempotent() {
        let mut store = ScheduleStore::from_shifts(vec![
            shift(Day::Monday, ShiftType::Morning, &["a", "b"]),
            shift(Day::Tuesday, ShiftType::Morning, &["a"]),
            shift(Day::Saturday, ShiftType::Evening, &["c", "a"]),
            shift(Day::Sunday, ShiftType::Evening, &["c"]),
        ])
        .unwrap();

        assert_eq!(store.remove_staff("a"), 3);
        assert!(store.shifts().all(|s| !s.contains("a")));
        // Cells survive even when emptied
        assert_eq!(store.len(), 4);
        assert_eq!(store.remove_staff("a"), 0);
        assert_eq!(store.remove_staff("nobody"), 0);
    }

    #[test]
    fn test_add_assignment_never_duplicates() {
        let mut store = ScheduleStore::new();
        assert!(store.add_assignment(Day::Monday, ShiftType::Morning, "a"));
        assert!(!store.add_assignment(Day::Monday, ShiftType::Morning, "a"));
        assert!(store.add_assignment(Day::Monday, ShiftType::Morning, "b"));
        let cell = store.find_cell(Day::Monday, ShiftType::Morning).unwrap();
        assert_eq!(cell.staff_ids.len(), 2);
    }

    #[test]
    fn test_remove_assignment_keeps_cell() {
        let mut store = ScheduleStore::new();
        store.add_assignment(Day::Wednesday, ShiftType::Afternoon, "a");
        assert!(store.remove_assignment(Day::Wednesday, ShiftType::Afternoon, "a"));
        assert!(!store.remove_assignment(Day::Wednesday, ShiftType::Afternoon, "a"));
        assert!(!store.remove_assignment(Day::Thursday, ShiftType::Afternoon, "a"));
        let cell = store.find_cell(Day::Wednesday, ShiftType::Afternoon).unwrap();
        assert!(cell.staff_ids.is_empty());
    }

    #[test]
    fn test_duplicate_staff_in_cell_collapsed() {
        let store =
            ScheduleStore::from_shifts(vec![shift(Day::Monday, ShiftType::Morning, &["a", "a"])])
                .unwrap();
        let cell = store.find_cell(Day::Monday, ShiftType::Morning).unwrap();
        assert_eq!(cell.staff_ids, vec![StaffRef::from("a")]);
    }

    #[test]
    fn test_blob_round_trip_preserves_cells() {
        let store = ScheduleStore::from_shifts(vec![
            shift(Day::Sunday, ShiftType::Evening, &["c"]),
            shift(Day::Monday, ShiftType::Morning, &[]),
        ])
        .unwrap();
        let json = serde_json::to_string(&store).unwrap();
        let restored: ScheduleStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store);
        // Week order on the wire
        assert_eq!(restored.to_vec()[0].day, Day::Monday);
    }
}
