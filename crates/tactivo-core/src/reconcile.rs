//! Day Reconciler: compacts day labels and renumbers positions.
//!
//! Days that hold at least one exercise are ranked by character code and
//! relabelled `A, B, C, ...`; empty days vanish. Within each day items are
//! stably sorted by their current position and renumbered `0..n-1`. The pass
//! is pure, total and idempotent.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::day::Day;
use crate::exercise::{Placed, Placement};

/// Result of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized<T> {
    /// Items grouped by new day, each group in position order.
    pub normalized: Vec<T>,
    /// New day labels in order; never empty.
    pub days_compact: Vec<Day>,
}

/// Relabels days and renumbers positions.
///
/// `declared` only matters when `list` is empty: the declared days are then
/// deduplicated, sorted and relabelled from `A`, or `[A]` if none exist.
pub fn normalize_program_exercises<T>(list: &[T], declared: &[Day]) -> Normalized<T>
where
    T: Placed + Clone,
{
    let present: BTreeSet<Day> = list.iter().map(|item| item.placement().day).collect();

    if present.is_empty() {
        let declared_count = declared.iter().collect::<BTreeSet<_>>().len();
        return Normalized {
            normalized: Vec::new(),
            days_compact: Day::sequence(declared_count.max(1)),
        };
    }

    // Old day -> bucket of items, keyed in character-code order.
    let mut buckets: IndexMap<Day, Vec<T>> = present.iter().map(|d| (*d, Vec::new())).collect();
    for item in list {
        if let Some(bucket) = buckets.get_mut(&item.placement().day) {
            bucket.push(item.clone());
        }
    }

    let mut normalized = Vec::with_capacity(list.len());
    let mut days_compact = Vec::with_capacity(buckets.len());
    for (rank, (_, mut bucket)) in buckets.into_iter().enumerate() {
        // At most DAY_LETTERS distinct days exist, so the rank always fits.
        let new_day = Day(rank as u8);
        bucket.sort_by_key(|item| item.placement().position);
        for (position, mut item) in bucket.into_iter().enumerate() {
            item.set_placement(Placement::new(new_day, position as u32));
            normalized.push(item);
        }
        days_compact.push(new_day);
    }

    Normalized {
        normalized,
        days_compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        placement: Placement,
    }

    impl Placed for Row {
        fn placement(&self) -> Placement {
            self.placement
        }
        fn set_placement(&mut self, placement: Placement) {
            self.placement = placement;
        }
    }

    fn day(s: &str) -> Day {
        s.parse().unwrap()
    }

    fn row(id: u32, d: &str, position: u32) -> Row {
        Row {
            id,
            placement: Placement::new(day(d), position),
        }
    }

    fn find(rows: &[Row], id: u32) -> Placement {
        rows.iter().find(|r| r.id == id).unwrap().placement
    }

    #[test]
    fn compaction_removes_gap() {
        let list = vec![row(1, "A", 0), row(2, "A", 1), row(3, "C", 0)];
        let out = normalize_program_exercises(&list, &[day("A"), day("B"), day("C")]);

        assert_eq!(out.days_compact, vec![day("A"), day("B")]);
        assert_eq!(find(&out.normalized, 1), Placement::new(day("A"), 0));
        assert_eq!(find(&out.normalized, 2), Placement::new(day("A"), 1));
        assert_eq!(find(&out.normalized, 3), Placement::new(day("B"), 0));
    }

    #[test]
    fn relabels_by_character_code_not_declared_order() {
        let list = vec![row(1, "C", 0), row(2, "A", 0), row(3, "B", 0)];
        let out = normalize_program_exercises(&list, &[day("C"), day("A"), day("B")]);

        assert_eq!(out.days_compact, Day::sequence(3));
        assert_eq!(find(&out.normalized, 2).day, day("A"));
        assert_eq!(find(&out.normalized, 3).day, day("B"));
        assert_eq!(find(&out.normalized, 1).day, day("C"));
    }

    #[test]
    fn renumbers_sparse_positions_stably() {
        let list = vec![row(1, "B", 7), row(2, "B", 3), row(3, "B", 7)];
        let out = normalize_program_exercises(&list, &[]);

        let ids: Vec<u32> = out.normalized.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(find(&out.normalized, 2), Placement::new(Day::A, 0));
        assert_eq!(find(&out.normalized, 1), Placement::new(Day::A, 1));
        assert_eq!(find(&out.normalized, 3), Placement::new(Day::A, 2));
    }

    #[test]
    fn empty_list_keeps_declared_count() {
        let out = normalize_program_exercises::<Row>(&[], &[day("C"), day("A"), day("C")]);
        assert!(out.normalized.is_empty());
        assert_eq!(out.days_compact, Day::sequence(2));

        let out = normalize_program_exercises::<Row>(&[], &[]);
        assert_eq!(out.days_compact, vec![Day::A]);
    }

    fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
        prop::collection::vec((0u8..8, 0u32..12), 0..24).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (d, p))| Row {
                    id: i as u32,
                    placement: Placement::new(Day(d), p),
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn days_compact_is_a_dense_letter_prefix(rows in arb_rows()) {
            let out = normalize_program_exercises(&rows, &[]);
            prop_assert!(!out.days_compact.is_empty());
            prop_assert_eq!(out.days_compact.clone(), Day::sequence(out.days_compact.len()));
        }

        #[test]
        fn new_day_is_rank_among_non_empty_days(rows in arb_rows()) {
            let present: Vec<Day> = rows
                .iter()
                .map(|r| r.placement.day)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let out = normalize_program_exercises(&rows, &[]);
            for original in &rows {
                let rank = present.iter().position(|d| *d == original.placement.day).unwrap();
                prop_assert_eq!(find(&out.normalized, original.id).day.index(), rank);
            }
        }

        #[test]
        fn positions_are_dense_per_day(rows in arb_rows()) {
            let out = normalize_program_exercises(&rows, &[]);
            for d in &out.days_compact {
                let mut positions: Vec<u32> = out
                    .normalized
                    .iter()
                    .filter(|r| r.placement.day == *d)
                    .map(|r| r.placement.position)
                    .collect();
                positions.sort_unstable();
                let expected: Vec<u32> = (0..positions.len() as u32).collect();
                prop_assert_eq!(positions, expected);
            }
        }

        #[test]
        fn normalization_is_idempotent(rows in arb_rows()) {
            let once = normalize_program_exercises(&rows, &[]);
            let twice = normalize_program_exercises(&once.normalized, &once.days_compact);
            prop_assert_eq!(once, twice);
        }
    }
}
