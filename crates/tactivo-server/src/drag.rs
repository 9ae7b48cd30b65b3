//! Active drag sessions and the frame pump that advances them.
//!
//! [`DragSessions`] keeps one [`DragController`] per (client, program) in a
//! `DashMap`, so hover traffic never touches the service lock. The frame pump
//! drains each session's coalesced hover once per tick.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

use tactivo_core::{
    BoardLayout, ClientId, Day, DragController, DragStart, DragState, HoverTarget, Indicator,
    MoveIntent, ProgramKey, RowKey,
};

use crate::error::ApiError;

type SessionKey = (ClientId, ProgramKey);

/// Snapshot of a drag session for callers polling its state.
#[derive(Debug, Clone, Serialize)]
pub struct DragStatus {
    #[serde(flatten)]
    pub state: DragState,
    pub indicator: Option<Indicator>,
    pub intent: Option<MoveIntent>,
    pub pending_hover: bool,
    pub coalesced: u64,
}

impl DragStatus {
    fn of(controller: &DragController) -> Self {
        DragStatus {
            state: controller.state().clone(),
            indicator: controller.indicator(),
            intent: controller.intent().cloned(),
            pending_hover: controller.has_pending_hover(),
            coalesced: controller.coalesced(),
        }
    }

    fn idle() -> Self {
        DragStatus {
            state: DragState::Idle,
            indicator: None,
            intent: None,
            pending_hover: false,
            coalesced: 0,
        }
    }
}

#[derive(Default)]
pub struct DragSessions {
    sessions: DashMap<SessionKey, DragController>,
}

impl DragSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_exercise(
        &self,
        client: ClientId,
        program: ProgramKey,
        key: RowKey,
        layout: BoardLayout,
    ) -> Result<DragStart, ApiError> {
        let mut controller = self.sessions.entry((client, program)).or_default();
        Ok(controller.begin_exercise(key, layout)?)
    }

    pub fn start_day_column(
        &self,
        client: ClientId,
        program: ProgramKey,
        day: Day,
        layout: BoardLayout,
    ) -> Result<DragStart, ApiError> {
        let mut controller = self.sessions.entry((client, program)).or_default();
        Ok(controller.begin_day_column(day, layout)?)
    }

    /// Queues a hover. Fails when no drag is active for the program.
    pub fn hover(
        &self,
        client: ClientId,
        program: ProgramKey,
        target: HoverTarget,
    ) -> Result<(), ApiError> {
        let accepted = self
            .sessions
            .get_mut(&(client, program))
            .map(|mut controller| controller.hover(target))
            .unwrap_or(false);
        if !accepted {
            return Err(ApiError::Conflict(format!(
                "no drag in progress for program {}",
                program
            )));
        }
        Ok(())
    }

    pub fn status(&self, client: ClientId, program: ProgramKey) -> DragStatus {
        self.sessions
            .get(&(client, program))
            .map(|controller| DragStatus::of(&controller))
            .unwrap_or_else(DragStatus::idle)
    }

    /// Ends the drag and returns the intent to apply, if any.
    pub fn finish(&self, client: ClientId, program: ProgramKey) -> Option<MoveIntent> {
        self.sessions
            .remove(&(client, program))
            .and_then(|(_, mut controller)| controller.release())
    }

    pub fn cancel(&self, client: ClientId, program: ProgramKey) -> bool {
        self.sessions.remove(&(client, program)).is_some()
    }

    /// Runs one frame on every session. Returns how many drained a hover.
    pub fn tick(&self) -> usize {
        let mut drained = 0;
        for mut entry in self.sessions.iter_mut() {
            if entry.value_mut().on_frame() {
                drained += 1;
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Spawns the background frame pump.
    pub fn start_frame_pump(self: &Arc<Self>, interval: Duration) {
        let sessions = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let drained = sessions.tick();
                if drained > 0 {
                    tracing::trace!("Applied hover for {} drag session(s)", drained);
                }
            }
        });
    }
}
