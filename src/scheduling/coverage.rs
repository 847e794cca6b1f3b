//! Staffing adequacy per cell, derived from the schedule and requirements.
//!
//! Everything here is pure and cheap enough to run on every read.

use std::collections::HashSet;

use serde::Serialize;

use super::{RequirementMatrix, ScheduleStore};
use crate::models::{Day, Role, ShiftType, Staff};

/// Assigned versus required headcount for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub assigned_count: u32,
    pub required_count: u32,
    pub is_short_staffed: bool,
}

impl Coverage {
    fn new(assigned_count: u32, required_count: u32) -> Self {
        Self {
            assigned_count,
            required_count,
            is_short_staffed: assigned_count < required_count,
        }
    }

    pub fn shortfall(&self) -> u32 {
        self.required_count.saturating_sub(self.assigned_count)
    }
}

pub fn coverage(
    day: Day,
    shift: ShiftType,
    schedule: &ScheduleStore,
    requirements: &RequirementMatrix,
) -> Coverage {
    let assigned = schedule
        .find_cell(day, shift)
        .map(|cell| cell.staff_ids.len())
        .unwrap_or(0);
    Coverage::new(saturating_u32(assigned), requirements.get(day, shift))
}

/// Like [`coverage`], but ids missing from the roster do not count.
pub fn coverage_for_roster(
    day: Day,
    shift: ShiftType,
    schedule: &ScheduleStore,
    requirements: &RequirementMatrix,
    roster: &HashSet<&str>,
) -> Coverage {
    let assigned = schedule
        .find_cell(day, shift)
        .map(|cell| {
            cell.staff_ids
                .iter()
                .filter(|id| roster.contains(id.as_str()))
                .count()
        })
        .unwrap_or(0);
    Coverage::new(saturating_u32(assigned), requirements.get(day, shift))
}

pub fn is_working(day: Day, shift: ShiftType, schedule: &ScheduleStore, staff_id: &str) -> bool {
    schedule
        .find_cell(day, shift)
        .is_some_and(|cell| cell.contains(staff_id))
}

/// A staff member shown in a grid cell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedStaff {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// One cell of the weekly grid as presented to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub day: Day,
    pub shift_type: ShiftType,
    pub time_range: &'static str,
    /// False when no schedule has been generated for this cell.
    pub scheduled: bool,
    pub staff: Vec<AssignedStaff>,
    pub coverage: Coverage,
    pub is_mine: bool,
}

/// Build all 21 cells in week order.
///
/// Ids that no longer resolve to a roster entry are left out of both the
/// staff list and the assigned count.
pub fn weekly_grid(
    schedule: &ScheduleStore,
    requirements: &RequirementMatrix,
    roster: &[Staff],
    viewer: Option<&str>,
) -> Vec<GridCell> {
    let known: HashSet<&str> = roster.iter().map(|s| s.id.as_str()).collect();
    let mut grid = Vec::with_capacity(Day::ALL.len() * ShiftType::ALL.len());

    for day in Day::ALL {
        for shift in ShiftType::ALL {
            let cell = schedule.find_cell(day, shift);
            let staff = cell
                .map(|c| {
                    c.staff_ids
                        .iter()
                        .filter_map(|id| id.resolve(roster))
                        .map(|s| AssignedStaff {
                            id: s.id.clone(),
                            name: s.name.clone(),
                            role: s.role,
                        })
                        .collect()
                })
                .unwrap_or_default();

            grid.push(GridCell {
                day,
                shift_type: shift,
                time_range: shift.time_range(),
                scheduled: cell.is_some(),
                staff,
                coverage: coverage_for_roster(day, shift, schedule, requirements, &known),
                is_mine: viewer
                    .map(|id| known.contains(id) && is_working(day, shift, schedule, id))
                    .unwrap_or(false),
            });
        }
    }

    grid
}

/// Aggregate counts over a weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub scheduled_cells: usize,
    pub unscheduled_cells: usize,
    pub short_staffed_cells: usize,
    pub total_shortfall: u32,
}

pub fn summarize(grid: &[GridCell]) -> CoverageSummary {
    let scheduled: Vec<&GridCell> = grid.iter().filter(|c| c.scheduled).collect();
    CoverageSummary {
        scheduled_cells: scheduled.len(),
        unscheduled_cells: grid.len() - scheduled.len(),
        short_staffed_cells: scheduled
            .iter()
            .filter(|c| c.coverage.is_short_staffed)
            .count(),
        total_shortfall: scheduled.iter().map(|c| c.coverage.shortfall()).sum(),
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
