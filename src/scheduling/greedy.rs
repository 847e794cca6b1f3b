//! Built-in deterministic generator used when no remote generator is configured.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{GenerationRequest, GeneratorError, GeneratorStaff, ScheduleGenerator};
use crate::models::{AvailabilitySlot, Day, RawShift, ShiftType};

/// Fills each cell in week order with available staff, up to the requirement.
///
/// Candidates are ranked by role preference for the shift, then by how many
/// shifts they already hold this week, then by whether they held the same
/// cell in the previous schedule. The requirement is never exceeded and
/// nobody is assigned outside their declared availability.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyGenerator;

#[async_trait]
impl ScheduleGenerator for GreedyGenerator {
    fn name(&self) -> &'static str {
        "greedy"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<RawShift>, GeneratorError> {
        Ok(assign(request))
    }
}

fn assign(request: &GenerationRequest) -> Vec<RawShift> {
    let mut load: HashMap<&str, usize> = HashMap::new();
    let mut shifts = Vec::with_capacity(Day::ALL.len() * ShiftType::ALL.len());

    for day in Day::ALL {
        for shift in ShiftType::ALL {
            let slot = AvailabilitySlot::new(day, shift);
            let required = request.requirements.get(day, shift) as usize;
            let previous = request
                .existing_schedule
                .iter()
                .find(|s| s.day == day && s.shift_type == shift);

            let mut candidates: Vec<&GeneratorStaff> = request
                .staff
                .iter()
                .filter(|s| s.availability.contains(&slot))
                .collect();
            candidates.sort_by_key(|s| {
                (
                    !s.role.preferred_for(shift),
                    load.get(s.id.as_str()).copied().unwrap_or(0),
                    !previous.is_some_and(|p| p.contains(&s.id)),
                    s.name.clone(),
                    s.id.clone(),
                )
            });

            let chosen: Vec<String> = candidates
                .into_iter()
                .take(required)
                .map(|s| {
                    *load.entry(s.id.as_str()).or_insert(0) += 1;
                    s.id.clone()
                })
                .collect();

            shifts.push(RawShift {
                id: None,
                day: day.label().to_string(),
                shift_type: shift.label().to_string(),
                staff_ids: chosen,
            });
        }
    }

    shifts
}
