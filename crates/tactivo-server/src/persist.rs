//! Persistence batches for placement changes.
//!
//! A [`PersistBatch`] is opened under the service lock, dispatched with the
//! lock released (all updates concurrently, awaited as a group) and settled
//! under the lock again. Each batch carries the client's generation number at
//! the time it was opened; a response for a row that a newer batch has since
//! re-dispatched is ignored on settle.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use tactivo_core::{ClientId, PlacementChange, ProgramKey, RowId};
use tactivo_storage::{ProgramStore, StorageError};

use crate::notify::{ToastKind, ORDER_PENDING, ORDER_SAVED, ORDER_SAVE_FAILED};
use crate::state::AppState;

/// Placement updates opened against one program.
#[derive(Debug, Clone)]
pub struct PersistBatch {
    pub client: ClientId,
    pub program: ProgramKey,
    pub generation: u64,
    pub changes: Vec<PlacementChange>,
    /// The client has local edits not yet saved.
    pub unsaved: bool,
}

/// Result of one dispatched update.
#[derive(Debug)]
pub struct RowResult {
    pub change: PlacementChange,
    pub result: Result<(), StorageError>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub client: ClientId,
    pub program: ProgramKey,
    pub generation: u64,
    pub results: Vec<RowResult>,
    pub unsaved: bool,
}

/// What settling a batch did to the in-memory rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettleReport {
    pub sent: usize,
    pub confirmed: usize,
    pub failed: Vec<RowId>,
    /// Responses ignored because a newer batch owns the row.
    pub stale: usize,
}

impl PersistBatch {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Sends every update concurrently and waits for all of them.
    pub async fn dispatch(self, store: &Arc<dyn ProgramStore>) -> BatchOutcome {
        let updates = self.changes.iter().map(|change| {
            let store = Arc::clone(store);
            let change = *change;
            async move {
                let result = store.update_placement(change.row, change.to).await;
                RowResult { change, result }
            }
        });
        let results = join_all(updates).await;

        BatchOutcome {
            client: self.client,
            program: self.program,
            generation: self.generation,
            results,
            unsaved: self.unsaved,
        }
    }
}

/// The toast to show once a batch has settled, if any.
pub fn toast_for(report: &SettleReport, unsaved: bool) -> Option<(ToastKind, &'static str)> {
    if !report.failed.is_empty() {
        Some((ToastKind::Error, ORDER_SAVE_FAILED))
    } else if report.confirmed > 0 {
        Some((ToastKind::Saved, ORDER_SAVED))
    } else if report.sent == 0 && unsaved {
        Some((ToastKind::Pending, ORDER_PENDING))
    } else {
        None
    }
}

/// Dispatches `batch` outside the service lock, settles it and notifies.
pub async fn run(state: &AppState, batch: PersistBatch) -> SettleReport {
    let client = batch.client;
    let program = batch.program;
    let unsaved = batch.unsaved;

    let outcome = batch.dispatch(&state.store).await;
    let report = state.service.lock().await.settle(outcome);

    if let Some((kind, title)) = toast_for(&report, unsaved) {
        state.notifier.push(kind, title, client, Some(program));
    }
    report
}
