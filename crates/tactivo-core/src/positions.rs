//! Position Normalizer, pure half.
//!
//! Reconciles a program in memory and reports which persisted rows now sit
//! somewhere the row store does not know about. Dispatching those changes is
//! the server's job.

use serde::{Deserialize, Serialize};

use crate::day::Day;
use crate::exercise::{Placed, Placement, ProgramExercise};
use crate::id::RowId;
use crate::program::Program;
use crate::reconcile::normalize_program_exercises;

/// A single remote `update(row, {day, position})` to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementChange {
    pub row: RowId,
    /// Last placement acknowledged by the store.
    pub from: Option<Placement>,
    pub to: Placement,
}

/// Renumbers the items of one day `0..n-1`, keeping their slice order.
pub fn renumber_positions<T: Placed>(items: &mut [T]) {
    for (position, item) in items.iter_mut().enumerate() {
        let day = item.placement().day;
        item.set_placement(Placement::new(day, position as u32));
    }
}

/// True when the positions of `day` are exactly `{0..n-1}`.
pub fn is_dense<T: Placed>(items: &[T], day: Day) -> bool {
    let mut positions: Vec<u32> = items
        .iter()
        .map(Placed::placement)
        .filter(|p| p.day == day)
        .map(|p| p.position)
        .collect();
    positions.sort_unstable();
    positions.iter().enumerate().all(|(i, p)| *p == i as u32)
}

/// Persisted rows whose placement differs from the confirmed one.
pub fn pending_placements(exercises: &[ProgramExercise]) -> Vec<PlacementChange> {
    exercises
        .iter()
        .filter(|pe| pe.is_pending())
        .filter_map(|pe| {
            pe.key.row_id().map(|row| PlacementChange {
                row,
                from: pe.confirmed,
                to: pe.placement,
            })
        })
        .collect()
}

/// Reconciles `program` (or replaces its list with `exercises` first) and
/// returns the placement updates the store still needs.
pub fn update_program_exercises_positions(
    program: &mut Program,
    exercises: Option<Vec<ProgramExercise>>,
) -> Vec<PlacementChange> {
    let source = exercises.unwrap_or_else(|| std::mem::take(&mut program.exercises));
    let out = normalize_program_exercises(&source, &program.days);
    program.exercises = out.normalized;
    program.days = out.days_compact;
    pending_placements(&program.exercises)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{ExerciseRef, WorkoutParams};
    use crate::id::{ExerciseId, ProgramKey};

    fn day(s: &str) -> Day {
        s.parse().unwrap()
    }

    fn stored(row: i64, d: &str, position: u32) -> ProgramExercise {
        ProgramExercise::from_stored(
            RowId(row),
            ExerciseRef::bare(ExerciseId(row)),
            Placement::new(day(d), position),
            WorkoutParams::default(),
        )
    }

    #[test]
    fn renumber_follows_slice_order() {
        let mut items = vec![
            Placement::new(Day::A, 4),
            Placement::new(Day::A, 9),
            Placement::new(Day::A, 1),
        ];
        renumber_positions(&mut items);
        let positions: Vec<u32> = items.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(is_dense(&items, Day::A));
    }

    #[test]
    fn gaps_are_not_dense() {
        let items = vec![Placement::new(Day::A, 0), Placement::new(Day::A, 2)];
        assert!(!is_dense(&items, Day::A));
        assert!(is_dense(&items, day("B")));
    }

    #[test]
    fn normalizer_reports_only_moved_persisted_rows() {
        let mut program = Program::new(ProgramKey::Persisted(crate::id::ProgramId(1)), "P");
        program.days = vec![day("A"), day("B"), day("C")];
        program.exercises = vec![stored(1, "A", 0), stored(2, "A", 1), stored(3, "C", 0)];
        let local = ProgramExercise::new_local(
            ExerciseRef::bare(ExerciseId(9)),
            Placement::new(day("C"), 1),
        );
        program.exercises.push(local);

        let changes = update_program_exercises_positions(&mut program, None);

        assert_eq!(program.days, vec![day("A"), day("B")]);
        assert_eq!(
            changes,
            vec![PlacementChange {
                row: RowId(3),
                from: Some(Placement::new(day("C"), 0)),
                to: Placement::new(day("B"), 0),
            }]
        );
        assert!(is_dense(&program.exercises, day("A")));
        assert!(is_dense(&program.exercises, day("B")));
    }

    #[test]
    fn explicit_list_replaces_program_state() {
        let mut program = Program::new(ProgramKey::Persisted(crate::id::ProgramId(1)), "P");
        program.exercises = vec![stored(1, "A", 0)];

        let changes =
            update_program_exercises_positions(&mut program, Some(vec![stored(5, "B", 3)]));

        assert_eq!(program.exercises.len(), 1);
        assert_eq!(program.exercises[0].placement, Placement::new(Day::A, 0));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].row, RowId(5));
    }
}
