//! Drag Controller: turns pointer events into move intents.
//!
//! A drag starts from a snapshot of the board (ordered keys per day column).
//! Hovers are coalesced into a [`LatestSlot`] and resolved once per frame into
//! a [`MoveIntent`] plus an insertion [`Indicator`]. Releasing yields the
//! intent, which callers apply to the current program with
//! [`BoardLayout::apply`] and [`Program::arrange`].

use serde::{Deserialize, Serialize};

use crate::coalesce::LatestSlot;
use crate::day::Day;
use crate::error::CoreError;
use crate::id::RowKey;
use crate::program::Program;

/// One day column: its label and the keys it holds, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub day: Day,
    pub keys: Vec<RowKey>,
}

/// Ordered day columns of a program.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardLayout {
    pub columns: Vec<Column>,
}

impl BoardLayout {
    /// Columns for every declared day (plus any undeclared day in use), keys
    /// in position order.
    pub fn from_program(program: &Program) -> Self {
        let mut days = program.days.clone();
        for pe in &program.exercises {
            if !days.contains(&pe.placement.day) {
                days.push(pe.placement.day);
            }
        }
        days.sort();
        days.dedup();

        let columns = days
            .into_iter()
            .map(|day| Column {
                day,
                keys: program.day_items(day).iter().map(|pe| pe.key).collect(),
            })
            .collect();
        BoardLayout { columns }
    }

    /// Column index and row index of `key`.
    pub fn locate(&self, key: &RowKey) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(c, col)| {
            col.keys.iter().position(|k| k == key).map(|i| (c, i))
        })
    }

    pub fn column_index(&self, day: Day) -> Option<usize> {
        self.columns.iter().position(|col| col.day == day)
    }

    /// Same keys in the same columns in the same order, ignoring labels.
    pub fn same_arrangement(&self, other: &BoardLayout) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.keys == b.keys)
    }

    /// Final index of column `day` when dropped on `over`: `over`'s index
    /// among the remaining columns, plus one for its bottom half.
    pub fn column_destination(&self, day: Day, over: Day, half: Half) -> Option<usize> {
        let from = self.column_index(day)?;
        if day == over {
            self.column_index(over)?;
            return Some(from);
        }
        let remaining: Vec<Day> = self
            .columns
            .iter()
            .map(|col| col.day)
            .filter(|d| *d != day)
            .collect();
        let target = remaining.iter().position(|d| *d == over)?;
        let at = match half {
            Half::Top => target,
            Half::Bottom => target + 1,
        };
        Some(at.min(remaining.len()))
    }

    /// The layout after `intent`, or `None` if it names an unknown key or day.
    pub fn apply(&self, intent: &MoveIntent) -> Option<BoardLayout> {
        let mut next = self.clone();
        match intent {
            MoveIntent::Reorder { key, target } => {
                let (col, from) = next.locate(key)?;
                let (target_col, to) = next.locate(target)?;
                if target_col != col {
                    let day = next.columns[target_col].day;
                    return self.apply(&MoveIntent::MoveAcross {
                        key: *key,
                        to_day: day,
                        before: Some(*target),
                    });
                }
                let keys = &mut next.columns[col].keys;
                let moved = keys.remove(from);
                let to = to.min(keys.len());
                keys.insert(to, moved);
            }
            MoveIntent::MoveAcross { key, to_day, before } => {
                let (col, from) = next.locate(key)?;
                let dest = next.column_index(*to_day)?;
                let moved = next.columns[col].keys.remove(from);
                let keys = &mut next.columns[dest].keys;
                let at = match before {
                    Some(target) if target != key => {
                        keys.iter().position(|k| k == target).unwrap_or(keys.len())
                    }
                    _ => keys.len(),
                };
                keys.insert(at, moved);
            }
            MoveIntent::ReorderDays { day, over, half } => {
                let from = next.column_index(*day)?;
                let at = next.column_destination(*day, *over, *half)?;
                let moved = next.columns.remove(from);
                next.columns.insert(at, moved);
                for (i, col) in next.columns.iter_mut().enumerate() {
                    col.day = Day::from_index(i).ok()?;
                }
            }
        }
        Some(next)
    }
}

/// Which vertical half of a column header the pointer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    Top,
    Bottom,
}

/// Vertical extent of a hovered element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Half {
    pub fn of(pointer_y: f64, rect: Rect) -> Half {
        if pointer_y < rect.top + rect.height / 2.0 {
            Half::Top
        } else {
            Half::Bottom
        }
    }
}

/// What the pointer is currently over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HoverTarget {
    Exercise { key: RowKey },
    /// Drop zone past the last card of a day.
    EndOfDay { day: Day },
    DayColumn { day: Day, pointer_y: f64, rect: Rect },
}

/// A structural change requested by a drag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveIntent {
    /// Move `key` to the pre-drag index of `target` within the same day.
    Reorder { key: RowKey, target: RowKey },
    /// Move `key` into `to_day`, before `before` or at the end.
    MoveAcross {
        key: RowKey,
        to_day: Day,
        before: Option<RowKey>,
    },
    /// Move column `day` next to column `over`, then relabel all columns.
    ReorderDays { day: Day, over: Day, half: Half },
}

/// Where the insertion marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Indicator {
    Slot { day: Day, index: usize },
    Column { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    Idle,
    DraggingExercise { key: RowKey },
    DraggingDayColumn { day: Day },
}

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragStart {
    Started,
    /// Another drag is already active.
    Ignored,
}

/// Drag state machine for one board.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    snapshot: Option<BoardLayout>,
    pending: LatestSlot<HoverTarget>,
    current: Option<MoveIntent>,
    indicator: Option<Indicator>,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        DragController {
            state: DragState::Idle,
            snapshot: None,
            pending: LatestSlot::new(),
            current: None,
            indicator: None,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    pub fn indicator(&self) -> Option<Indicator> {
        self.indicator
    }

    pub fn intent(&self) -> Option<&MoveIntent> {
        self.current.as_ref()
    }

    pub fn has_pending_hover(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Hovers dropped before a frame could apply them.
    pub fn coalesced(&self) -> u64 {
        self.pending.superseded()
    }

    pub fn begin_exercise(
        &mut self,
        key: RowKey,
        layout: BoardLayout,
    ) -> Result<DragStart, CoreError> {
        if !self.is_idle() {
            return Ok(DragStart::Ignored);
        }
        if layout.locate(&key).is_none() {
            return Err(CoreError::ExerciseNotFound { key });
        }
        self.state = DragState::DraggingExercise { key };
        self.snapshot = Some(layout);
        Ok(DragStart::Started)
    }

    pub fn begin_day_column(
        &mut self,
        day: Day,
        layout: BoardLayout,
    ) -> Result<DragStart, CoreError> {
        if !self.is_idle() {
            return Ok(DragStart::Ignored);
        }
        if layout.column_index(day).is_none() {
            return Err(CoreError::DayNotFound { day });
        }
        self.state = DragState::DraggingDayColumn { day };
        self.snapshot = Some(layout);
        Ok(DragStart::Started)
    }

    /// Queues a hover for the next frame. Returns `false` when idle.
    pub fn hover(&mut self, target: HoverTarget) -> bool {
        if self.is_idle() {
            return false;
        }
        self.pending.offer(target);
        true
    }

    /// Applies the latest queued hover. Returns `true` if one was drained.
    pub fn on_frame(&mut self) -> bool {
        let Some(target) = self.pending.take() else {
            return false;
        };
        let Some(snapshot) = self.snapshot.as_ref() else {
            return false;
        };
        let Some(intent) = resolve(&self.state, snapshot, &target) else {
            return true;
        };

        match snapshot.apply(&intent) {
            Some(preview) if !preview.same_arrangement(snapshot) => {
                self.indicator = indicator_for(&intent, snapshot, &preview);
                self.current = Some(intent);
            }
            Some(_) => {
                self.indicator = None;
                self.current = None;
            }
            None => {}
        }
        true
    }

    /// Ends the drag, honouring a hover still waiting for its frame.
    pub fn release(&mut self) -> Option<MoveIntent> {
        self.on_frame();
        let intent = self.current.take();
        self.reset();
        intent
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.state = DragState::Idle;
        self.snapshot = None;
        self.pending.clear();
        self.current = None;
        self.indicator = None;
    }
}

fn resolve(state: &DragState, snapshot: &BoardLayout, target: &HoverTarget) -> Option<MoveIntent> {
    match (state, target) {
        (DragState::DraggingExercise { key }, HoverTarget::Exercise { key: over }) => {
            if over == key {
                return None;
            }
            let (col, _) = snapshot.locate(key)?;
            let (over_col, _) = snapshot.locate(over)?;
            if col == over_col {
                Some(MoveIntent::Reorder {
                    key: *key,
                    target: *over,
                })
            } else {
                Some(MoveIntent::MoveAcross {
                    key: *key,
                    to_day: snapshot.columns[over_col].day,
                    before: Some(*over),
                })
            }
        }
        // A card over a column header lands at the end of that day.
        (DragState::DraggingExercise { key }, HoverTarget::EndOfDay { day })
        | (DragState::DraggingExercise { key }, HoverTarget::DayColumn { day, .. }) => {
            snapshot.column_index(*day)?;
            Some(MoveIntent::MoveAcross {
                key: *key,
                to_day: *day,
                before: None,
            })
        }
        (
            DragState::DraggingDayColumn { day },
            HoverTarget::DayColumn {
                day: over,
                pointer_y,
                rect,
            },
        ) => Some(MoveIntent::ReorderDays {
            day: *day,
            over: *over,
            half: Half::of(*pointer_y, *rect),
        }),
        _ => None,
    }
}

fn indicator_for(intent: &MoveIntent, snapshot: &BoardLayout, preview: &BoardLayout) -> Option<Indicator> {
    match intent {
        MoveIntent::Reorder { key, .. } | MoveIntent::MoveAcross { key, .. } => {
            let (col, index) = preview.locate(key)?;
            Some(Indicator::Slot {
                day: preview.columns[col].day,
                index,
            })
        }
        MoveIntent::ReorderDays { day, over, half } => snapshot
            .column_destination(*day, *over, *half)
            .map(|index| Indicator::Column { index }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{ExerciseRef, Placement, ProgramExercise, WorkoutParams};
    use crate::id::{ExerciseId, ProgramId, ProgramKey, RowId};

    fn day(s: &str) -> Day {
        s.parse().unwrap()
    }

    fn key(row: i64) -> RowKey {
        RowKey::Persisted(RowId(row))
    }

    fn program(rows: &[(i64, &str, u32)]) -> Program {
        let rows = rows
            .iter()
            .map(|(row, d, position)| {
                ProgramExercise::from_stored(
                    RowId(*row),
                    ExerciseRef::bare(ExerciseId(*row)),
                    Placement::new(day(d), *position),
                    WorkoutParams::default(),
                )
            })
            .collect();
        Program::hydrate(ProgramKey::Persisted(ProgramId(1)), "Program 1", None, rows)
    }

    fn drop_into(p: &mut Program, intent: &MoveIntent) {
        let layout = BoardLayout::from_program(p).apply(intent).unwrap();
        p.arrange(&layout);
        p.normalize();
    }

    fn placement(p: &Program, row: i64) -> (String, u32) {
        let pe = p.find(&key(row)).unwrap();
        (pe.placement.day.to_string(), pe.placement.position)
    }

    fn column_hover(d: &str, pointer_y: f64) -> HoverTarget {
        HoverTarget::DayColumn {
            day: day(d),
            pointer_y,
            rect: Rect {
                top: 0.0,
                height: 100.0,
            },
        }
    }

    #[test]
    fn reorder_within_day_moves_to_target_index() {
        let mut p = program(&[(1, "A", 0), (2, "A", 1), (3, "A", 2)]);
        let mut drag = DragController::new();
        assert_eq!(
            drag.begin_exercise(key(3), BoardLayout::from_program(&p)).unwrap(),
            DragStart::Started
        );
        drag.hover(HoverTarget::Exercise { key: key(1) });
        let intent = drag.release().unwrap();
        assert!(drag.is_idle());

        drop_into(&mut p, &intent);
        assert_eq!(placement(&p, 3), ("A".into(), 0));
        assert_eq!(placement(&p, 1), ("A".into(), 1));
        assert_eq!(placement(&p, 2), ("A".into(), 2));
    }

    #[test]
    fn reorder_downward_uses_pre_drag_index() {
        let layout = BoardLayout::from_program(&program(&[(1, "A", 0), (2, "A", 1), (3, "A", 2)]));
        let next = layout
            .apply(&MoveIntent::Reorder {
                key: key(1),
                target: key(3),
            })
            .unwrap();
        assert_eq!(next.columns[0].keys, vec![key(2), key(3), key(1)]);
    }

    #[test]
    fn move_across_to_end_of_day_appends() {
        let mut p = program(&[(1, "A", 0), (2, "A", 1), (3, "B", 0)]);
        let mut drag = DragController::new();
        drag.begin_exercise(key(2), BoardLayout::from_program(&p)).unwrap();
        drag.hover(HoverTarget::EndOfDay { day: day("B") });
        assert!(drag.on_frame());
        assert_eq!(
            drag.indicator(),
            Some(Indicator::Slot {
                day: day("B"),
                index: 1
            })
        );
        let intent = drag.release().unwrap();

        drop_into(&mut p, &intent);
        assert_eq!(placement(&p, 1), ("A".into(), 0));
        assert_eq!(placement(&p, 3), ("B".into(), 0));
        assert_eq!(placement(&p, 2), ("B".into(), 1));
        assert_eq!(p.normalize().len(), 1);
        assert_eq!(p.find(&key(2)).unwrap().confirmed, Some(Placement::new(Day::A, 1)));
    }

    #[test]
    fn drop_on_last_card_inserts_before_it() {
        let mut p = program(&[(1, "A", 0), (2, "A", 1), (3, "B", 0)]);
        let mut drag = DragController::new();
        drag.begin_exercise(key(2), BoardLayout::from_program(&p)).unwrap();
        drag.hover(HoverTarget::Exercise { key: key(3) });
        let intent = drag.release().unwrap();

        drop_into(&mut p, &intent);
        assert_eq!(placement(&p, 2), ("B".into(), 0));
        assert_eq!(placement(&p, 3), ("B".into(), 1));
    }

    #[test]
    fn emptied_source_day_is_compacted_away() {
        let mut p = program(&[(1, "A", 0), (2, "B", 0)]);
        let intent = MoveIntent::MoveAcross {
            key: key(1),
            to_day: day("B"),
            before: None,
        };
        drop_into(&mut p, &intent);
        assert_eq!(p.days, vec![Day::A]);
        assert_eq!(placement(&p, 2), ("A".into(), 0));
        assert_eq!(placement(&p, 1), ("A".into(), 1));
    }

    #[test]
    fn hovering_own_card_shows_no_indicator() {
        let p = program(&[(1, "A", 0), (2, "A", 1)]);
        let mut drag = DragController::new();
        drag.begin_exercise(key(1), BoardLayout::from_program(&p)).unwrap();
        drag.hover(HoverTarget::Exercise { key: key(2) });
        drag.on_frame();
        assert!(drag.indicator().is_some());

        drag.hover(HoverTarget::Exercise { key: key(1) });
        drag.on_frame();
        // Self-hover resolves to nothing; the last real target stands.
        assert!(drag.indicator().is_some());

        drag.hover(HoverTarget::EndOfDay { day: day("A") });
        drag.on_frame();
        assert!(drag.indicator().is_some());
    }

    #[test]
    fn no_op_drop_yields_no_intent() {
        let p = program(&[(1, "A", 0), (2, "A", 1)]);
        let mut drag = DragController::new();
        drag.begin_exercise(key(2), BoardLayout::from_program(&p)).unwrap();
        drag.hover(HoverTarget::EndOfDay { day: day("A") });
        drag.on_frame();
        assert_eq!(drag.indicator(), None);
        assert_eq!(drag.release(), None);
    }

    #[test]
    fn column_reorder_relabels_every_day() {
        let mut p = program(&[(1, "A", 0), (2, "B", 0), (3, "C", 0)]);
        let mut drag = DragController::new();
        drag.begin_day_column(day("C"), BoardLayout::from_program(&p)).unwrap();
        drag.hover(column_hover("A", 10.0));
        drag.on_frame();
        assert_eq!(drag.indicator(), Some(Indicator::Column { index: 0 }));
        let intent = drag.release().unwrap();

        drop_into(&mut p, &intent);
        assert_eq!(placement(&p, 3), ("A".into(), 0));
        assert_eq!(placement(&p, 1), ("B".into(), 0));
        assert_eq!(placement(&p, 2), ("C".into(), 0));
    }

    #[test]
    fn column_bottom_half_inserts_after() {
        let layout = BoardLayout::from_program(&program(&[(1, "A", 0), (2, "B", 0), (3, "C", 0)]));
        let next = layout
            .apply(&MoveIntent::ReorderDays {
                day: day("A"),
                over: day("C"),
                half: Half::Bottom,
            })
            .unwrap();
        let order: Vec<Vec<RowKey>> = next.columns.iter().map(|c| c.keys.clone()).collect();
        assert_eq!(order, vec![vec![key(2)], vec![key(3)], vec![key(1)]]);
        assert_eq!(next.columns[2].day, day("C"));
    }

    #[test]
    fn column_dropped_in_place_is_a_no_op() {
        let p = program(&[(1, "A", 0), (2, "B", 0), (3, "C", 0)]);
        let mut drag = DragController::new();
        drag.begin_day_column(Day::A, BoardLayout::from_program(&p)).unwrap();
        drag.hover(column_hover("B", 10.0));
        assert_eq!(drag.release(), None);
    }

    #[test]
    fn only_one_drag_at_a_time() {
        let p = program(&[(1, "A", 0), (2, "B", 0)]);
        let mut drag = DragController::new();
        drag.begin_exercise(key(1), BoardLayout::from_program(&p)).unwrap();
        assert_eq!(
            drag.begin_day_column(day("B"), BoardLayout::from_program(&p)).unwrap(),
            DragStart::Ignored
        );
        assert_eq!(
            drag.state(),
            &DragState::DraggingExercise { key: key(1) }
        );
        drag.cancel();
        assert!(drag.is_idle());
        assert!(!drag.hover(HoverTarget::EndOfDay { day: Day::A }));
    }

    #[test]
    fn column_drag_ignores_card_targets() {
        let p = program(&[(1, "A", 0), (2, "B", 0)]);
        let mut drag = DragController::new();
        drag.begin_day_column(Day::A, BoardLayout::from_program(&p)).unwrap();
        drag.hover(HoverTarget::Exercise { key: key(2) });
        drag.on_frame();
        assert_eq!(drag.intent(), None);
    }

    #[test]
    fn hovers_coalesce_to_latest() {
        let p = program(&[(1, "A", 0), (2, "A", 1), (3, "B", 0)]);
        let mut drag = DragController::new();
        drag.begin_exercise(key(1), BoardLayout::from_program(&p)).unwrap();
        drag.hover(HoverTarget::Exercise { key: key(2) });
        drag.hover(HoverTarget::Exercise { key: key(3) });
        drag.hover(HoverTarget::EndOfDay { day: day("B") });
        assert_eq!(drag.coalesced(), 2);

        assert!(drag.on_frame());
        assert!(!drag.on_frame());
        assert_eq!(
            drag.intent(),
            Some(&MoveIntent::MoveAcross {
                key: key(1),
                to_day: day("B"),
                before: None
            })
        );
    }

    #[test]
    fn unknown_drag_source_is_an_error() {
        let p = program(&[(1, "A", 0)]);
        let mut drag = DragController::new();
        assert!(drag.begin_exercise(key(9), BoardLayout::from_program(&p)).is_err());
        assert!(drag.begin_day_column(day("D"), BoardLayout::from_program(&p)).is_err());
        assert!(drag.is_idle());
    }

    #[test]
    fn half_splits_at_midpoint() {
        let rect = Rect {
            top: 100.0,
            height: 40.0,
        };
        assert_eq!(Half::of(119.0, rect), Half::Top);
        assert_eq!(Half::of(120.0, rect), Half::Bottom);
    }

    #[test]
    fn hover_target_wire_format() {
        let target: HoverTarget =
            serde_json::from_str(r#"{"kind":"end_of_day","day":"B"}"#).unwrap();
        assert_eq!(target, HoverTarget::EndOfDay { day: day("B") });
        insta::assert_json_snapshot!(
            MoveIntent::MoveAcross { key: key(4), to_day: day("B"), before: None },
            @r###"
        {
          "kind": "move_across",
          "key": "4",
          "to_day": "B",
          "before": null
        }
        "###
        );
    }
}
