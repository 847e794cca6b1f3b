//! Scheduling state shared by the HTTP handlers.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use super::{
    coverage, coverage_for_roster, validate_generated, weekly_grid, Coverage, GenerationRequest,
    GeneratorError, GridCell, RequirementMatrix, ScheduleGenerator, ScheduleStore,
};
use crate::errors::AppError;
use crate::models::{Day, Shift, ShiftType, Staff};

/// Result of a successful regeneration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub generator: &'static str,
    pub cells: usize,
    pub dropped_staff_ids: Vec<String>,
    pub collapsed_duplicates: usize,
    /// Generated cells still below their required headcount.
    pub short_staffed_cells: usize,
    pub schedule: Vec<Shift>,
}

/// Owns the requirement matrix and the schedule, one lock per collection.
///
/// Persistence is not handled here. Callers save the snapshot handed out by
/// `schedule_for_save` / `requirements_for_save` while holding its guard, so
/// saves are serialized and the last one written is the latest state.
pub struct ScheduleService {
    requirements: RwLock<RequirementMatrix>,
    schedule: RwLock<ScheduleStore>,
    generator: Arc<dyn ScheduleGenerator>,
    generation: Mutex<()>,
    saving_requirements: Mutex<()>,
    saving_schedule: Mutex<()>,
    timeout: Duration,
}

impl ScheduleService {
    pub fn new(
        requirements: RequirementMatrix,
        schedule: ScheduleStore,
        generator: Arc<dyn ScheduleGenerator>,
        timeout: Duration,
    ) -> Self {
        Self {
            requirements: RwLock::new(requirements),
            schedule: RwLock::new(schedule),
            generator,
            generation: Mutex::new(()),
            saving_requirements: Mutex::new(()),
            saving_schedule: Mutex::new(()),
            timeout,
        }
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    pub async fn requirements(&self) -> RequirementMatrix {
        self.requirements.read().await.clone()
    }

    /// Update one requirement cell; returns the stored value and a snapshot.
    pub async fn set_requirement(
        &self,
        day: Day,
        shift: ShiftType,
        count: i64,
    ) -> Result<(u32, RequirementMatrix), AppError> {
        let mut requirements = self.requirements.write().await;
        let stored = requirements.set(day, shift, count)?;
        Ok((stored, requirements.clone()))
    }

    pub async fn schedule(&self) -> ScheduleStore {
        self.schedule.read().await.clone()
    }

    /// Latest schedule plus a guard that must be held until it is saved.
    pub async fn schedule_for_save(&self) -> (MutexGuard<'_, ()>, ScheduleStore) {
        let guard = self.saving_schedule.lock().await;
        let snapshot = self.schedule.read().await.clone();
        (guard, snapshot)
    }

    /// Latest requirements plus a guard that must be held until they are saved.
    pub async fn requirements_for_save(&self) -> (MutexGuard<'_, ()>, RequirementMatrix) {
        let guard = self.saving_requirements.lock().await;
        let snapshot = self.requirements.read().await.clone();
        (guard, snapshot)
    }

    /// One cell as seen against the roster.
    ///
    /// Ids that do not resolve to a roster entry are left out of both the
    /// returned cell and its coverage, matching the weekly grid.
    pub async fn cell(
        &self,
        day: Day,
        shift: ShiftType,
        roster: &[Staff],
    ) -> (Option<Shift>, Coverage) {
        let known: HashSet<&str> = roster.iter().map(|s| s.id.as_str()).collect();
        let schedule = self.schedule.read().await;
        let requirements = self.requirements.read().await;

        let cell = schedule.find_cell(day, shift).map(|cell| {
            let mut cell = cell.clone();
            cell.staff_ids.retain(|id| known.contains(id.as_str()));
            cell
        });
        let coverage = coverage_for_roster(day, shift, &schedule, &requirements, &known);
        (cell, coverage)
    }

    pub async fn grid(&self, roster: &[Staff], viewer: Option<&str>) -> Vec<GridCell> {
        let schedule = self.schedule.read().await;
        let requirements = self.requirements.read().await;
        weekly_grid(&schedule, &requirements, roster, viewer)
    }

    /// Ask the generator for a new schedule and swap it in if it validates.
    ///
    /// Only one generation may be outstanding; a concurrent call is rejected
    /// immediately. On any failure the current schedule is left untouched.
    ///
    /// The roster is loaded once to build the request and again under the
    /// schedule write lock just before the swap. Output is validated against
    /// that second read, so staff deleted while the generator was running are
    /// dropped: either the reload already misses them, or their deletion hook
    /// waits for the lock and runs against the new schedule.
    pub async fn regenerate<F, Fut>(&self, load_roster: F) -> Result<GenerationOutcome, AppError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Vec<Staff>, AppError>>,
    {
        let _pending = self
            .generation
            .try_lock()
            .map_err(|_| AppError::GenerationInProgress)?;

        let roster = load_roster().await?;
        let request = {
            let schedule = self.schedule.read().await;
            let requirements = self.requirements.read().await;
            GenerationRequest::new(&roster, &schedule, &requirements)
        };

        tracing::info!(
            generator = self.generator.name(),
            staff = roster.len(),
            "Generating weekly schedule"
        );

        let raw = match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(GeneratorError::Timeout(self.timeout).into()),
        };

        let mut schedule = self.schedule.write().await;
        let roster = load_roster().await?;
        let validated = validate_generated(raw, &roster)?;
        let store = ScheduleStore::from_shifts(validated.shifts)?;
        let short_staffed_cells = {
            let requirements = self.requirements.read().await;
            store
                .shifts()
                .filter(|cell| {
                    coverage(cell.day, cell.shift_type, &store, &requirements).is_short_staffed
                })
                .count()
        };
        let outcome = GenerationOutcome {
            generator: self.generator.name(),
            cells: store.len(),
            dropped_staff_ids: validated.dropped_staff_ids,
            collapsed_duplicates: validated.collapsed_duplicates,
            short_staffed_cells,
            schedule: store.to_vec(),
        };

        *schedule = store;
        tracing::info!(cells = outcome.cells, "Schedule replaced");
        Ok(outcome)
    }

    /// Manually assign a staff member; returns whether anything changed.
    pub async fn assign(&self, day: Day, shift: ShiftType, staff_id: &str) -> (bool, ScheduleStore) {
        let mut schedule = self.schedule.write().await;
        let changed = schedule.add_assignment(day, shift, staff_id);
        (changed, schedule.clone())
    }

    pub async fn unassign(
        &self,
        day: Day,
        shift: ShiftType,
        staff_id: &str,
    ) -> (bool, ScheduleStore) {
        let mut schedule = self.schedule.write().await;
        let changed = schedule.remove_assignment(day, shift, staff_id);
        (changed, schedule.clone())
    }

    /// Staff deletion hook: drop the id from every cell.
    pub async fn on_staff_deleted(&self, staff_id: &str) -> usize {
        let mut schedule = self.schedule.write().await;
        let touched = schedule.remove_staff(staff_id);
        if touched > 0 {
            tracing::info!("Removed staff {} from {} shift(s)", staff_id, touched);
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::{ready, Ready};
    use std::sync::Mutex as StdMutex;

    use crate::models::{AvailabilitySlot, RawShift, Role, StaffRef};
    use crate::scheduling::testing::{CannedGenerator, FailingGenerator, GatedGenerator};

    fn member(id: &str, slots: &[(Day, ShiftType)]) -> Staff {
        Staff {
            id: id.to_string(),
            name: id.to_string(),
            role: Role::Barista,
            phone: None,
            email: None,
            avatar: None,
            availability: slots
                .iter()
                .map(|(d, s)| AvailabilitySlot::new(*d, *s))
                .collect(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            version: 1,
        }
    }

    fn raw(day: &str, shift_type: &str, ids: &[&str]) -> RawShift {
        RawShift {
            id: None,
            day: day.to_string(),
            shift_type: shift_type.to_string(),
            staff_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn fixed(roster: Vec<Staff>) -> impl Fn() -> Ready<Result<Vec<Staff>, AppError>> {
        move || ready(Ok(roster.clone()))
    }

    fn service(generator: Arc<dyn ScheduleGenerator>, timeout: Duration) -> ScheduleService {
        ScheduleService::new(
            RequirementMatrix::default(),
            ScheduleStore::new(),
            generator,
            timeout,
        )
    }

    async fn staff_in(service: &ScheduleService, day: Day, shift: ShiftType) -> Vec<StaffRef> {
        service
            .schedule()
            .await
            .find_cell(day, shift)
            .map(|cell| cell.staff_ids.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_end_to_end_ghost_id_dropped() {
        let a = member("staff-a", &[(Day::Monday, ShiftType::Morning)]);
        let generator = Arc::new(CannedGenerator::new(vec![raw(
            "Monday",
            "Morning",
            &["staff-a", "ghost-id"],
        )]));
        let service = service(generator, Duration::from_secs(5));
        service
            .set_requirement(Day::Monday, ShiftType::Morning, 2)
            .await
            .unwrap();

        let outcome = service.regenerate(fixed(vec![a.clone()])).await.unwrap();
        assert_eq!(outcome.dropped_staff_ids, vec!["ghost-id".to_string()]);
        assert_eq!(outcome.short_staffed_cells, 1);

        let (cell, report) = service.cell(Day::Monday, ShiftType::Morning, &[a]).await;
        assert_eq!(cell.unwrap().staff_ids, vec![StaffRef::from("staff-a")]);
        assert_eq!(report.assigned_count, 1);
        assert_eq!(report.required_count, 2);
        assert!(report.is_short_staffed);
    }

    #[tokio::test]
    async fn test_cell_ignores_ids_missing_from_roster() {
        let service = service(
            Arc::new(FailingGenerator(GeneratorError::Empty)),
            Duration::from_secs(1),
        );
        service.assign(Day::Monday, ShiftType::Morning, "a").await;
        service.assign(Day::Monday, ShiftType::Morning, "gone").await;
        let roster = vec![member("a", &[])];

        let (cell, report) = service.cell(Day::Monday, ShiftType::Morning, &roster).await;
        assert_eq!(cell.unwrap().staff_ids, vec![StaffRef::from("a")]);
        assert_eq!(report.assigned_count, 1);
        assert!(report.is_short_staffed);

        // Same answer as the grid for that cell
        let grid = service.grid(&roster, None).await;
        assert_eq!(grid[0].coverage, report);

        let (missing, report) = service.cell(Day::Friday, ShiftType::Evening, &roster).await;
        assert!(missing.is_none());
        assert_eq!(report.assigned_count, 0);
    }

    #[tokio::test]
    async fn test_invalid_output_leaves_schedule_unchanged() {
        let roster = vec![member("a", &[])];
        let good = Arc::new(CannedGenerator::new(vec![raw("Thứ 2", "Sáng", &["a"])]));
        let service = service(good.clone(), Duration::from_secs(5));
        service.regenerate(fixed(roster.clone())).await.unwrap();
        let before = service.schedule().await;

        good.set_output(vec![raw("Thứ 2", "Sáng", &["a"]), raw("Thứ 2", "Sáng", &["a"])]);
        let result = service.regenerate(fixed(roster.clone())).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.schedule().await, before);

        good.set_output(vec![raw("Thứ 22", "Sáng", &["a"])]);
        assert!(service.regenerate(fixed(roster)).await.is_err());
        assert_eq!(service.schedule().await, before);
    }

    #[tokio::test]
    async fn test_generator_failure_is_recoverable() {
        let service = service(
            Arc::new(FailingGenerator(GeneratorError::Status(503))),
            Duration::from_secs(5),
        );
        service.assign(Day::Friday, ShiftType::Evening, "a").await;
        let before = service.schedule().await;

        let result = service.regenerate(fixed(Vec::new())).await;
        assert!(matches!(result, Err(AppError::Generation(_))));
        assert_eq!(service.schedule().await, before);

        // The gate is released after a failure
        let again = service.regenerate(fixed(Vec::new())).await;
        assert!(matches!(again, Err(AppError::Generation(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_generation_failure() {
        let gated = Arc::new(GatedGenerator::new(vec![raw("Thứ 2", "Sáng", &[])]));
        let service = service(gated, Duration::from_millis(50));
        let result = service.regenerate(fixed(Vec::new())).await;
        assert!(matches!(result, Err(AppError::Generation(_))));
        assert!(service.schedule().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_generation_rejected() {
        let gated = Arc::new(GatedGenerator::new(vec![raw("Thứ 3", "Tối", &["a"])]));
        let service = Arc::new(service(gated.clone(), Duration::from_secs(5)));
        let roster = vec![member("a", &[])];

        let background = service.clone();
        let background_roster = roster.clone();
        let pending =
            tokio::spawn(async move { background.regenerate(fixed(background_roster)).await });
        gated.started.notified().await;

        let second = service.regenerate(fixed(roster)).await;
        assert!(matches!(second, Err(AppError::GenerationInProgress)));
        assert_eq!(gated.calls(), 1);

        gated.release.notify_one();
        let first = pending.await.unwrap().unwrap();
        assert_eq!(first.cells, 1);
        assert_eq!(
            staff_in(&service, Day::Tuesday, ShiftType::Evening).await,
            vec![StaffRef::from("a")]
        );
    }

    #[tokio::test]
    async fn test_staff_deleted_during_generation_not_swapped_in() {
        let gated = Arc::new(GatedGenerator::new(vec![raw("Thứ 2", "Sáng", &["a", "b"])]));
        let service = Arc::new(service(gated.clone(), Duration::from_secs(5)));
        let roster = Arc::new(StdMutex::new(vec![member("a", &[]), member("b", &[])]));

        let background = service.clone();
        let shared = roster.clone();
        let pending = tokio::spawn(async move {
            background
                .regenerate(move || ready(Ok(shared.lock().unwrap().clone())))
                .await
        });
        gated.started.notified().await;

        // Delete "a" while the generator is still working
        roster.lock().unwrap().retain(|s| s.id != "a");
        assert_eq!(service.on_staff_deleted("a").await, 0);

        gated.release.notify_one();
        let outcome = pending.await.unwrap().unwrap();
        assert_eq!(outcome.dropped_staff_ids, vec!["a".to_string()]);
        assert_eq!(
            staff_in(&service, Day::Monday, ShiftType::Morning).await,
            vec![StaffRef::from("b")]
        );
    }

    #[tokio::test]
    async fn test_staff_deletion_hook() {
        let service = service(Arc::new(FailingGenerator(GeneratorError::Empty)), Duration::from_secs(1));
        service.assign(Day::Monday, ShiftType::Morning, "a").await;
        service.assign(Day::Monday, ShiftType::Evening, "a").await;
        service.assign(Day::Sunday, ShiftType::Evening, "a").await;
        service.assign(Day::Sunday, ShiftType::Evening, "b").await;

        assert_eq!(service.on_staff_deleted("a").await, 3);
        assert!(service.schedule().await.shifts().all(|s| !s.contains("a")));
        assert_eq!(service.on_staff_deleted("a").await, 0);
    }

    #[tokio::test]
    async fn test_manual_assignment_no_duplicates() {
        let service = service(Arc::new(FailingGenerator(GeneratorError::Empty)), Duration::from_secs(1));
        let (first, _) = service.assign(Day::Monday, ShiftType::Morning, "a").await;
        let (second, schedule) = service.assign(Day::Monday, ShiftType::Morning, "a").await;
        assert!(first);
        assert!(!second);
        assert_eq!(
            schedule
                .find_cell(Day::Monday, ShiftType::Morning)
                .unwrap()
                .staff_ids
                .len(),
            1
        );
        let (removed, _) = service.unassign(Day::Monday, ShiftType::Morning, "a").await;
        assert!(removed);
    }

    #[tokio::test]
    async fn test_saves_are_serialized_and_see_latest_state() {
        let service = Arc::new(service(
            Arc::new(FailingGenerator(GeneratorError::Empty)),
            Duration::from_secs(1),
        ));
        service.assign(Day::Monday, ShiftType::Morning, "a").await;

        let (guard, first) = service.schedule_for_save().await;
        assert_eq!(first.len(), 1);

        // A later edit's save waits for the earlier one to finish
        service.assign(Day::Tuesday, ShiftType::Morning, "b").await;
        let waiting = service.clone();
        let second = tokio::spawn(async move {
            let (_guard, snapshot) = waiting.schedule_for_save().await;
            snapshot
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!second.is_finished());

        drop(guard);
        let second = second.await.unwrap();
        assert_eq!(second.len(), 2);

        let (_guard, requirements) = service.requirements_for_save().await;
        assert_eq!(requirements, RequirementMatrix::default());
    }
}
