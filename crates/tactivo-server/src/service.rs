//! ProgramService: the single coordinator between HTTP handlers, the domain
//! model and the row store.
//!
//! Each client's programs are loaded once and then edited in memory. Edits
//! that move rows normalize the program and open a [`PersistBatch`]; the
//! caller dispatches it without holding the service lock and hands the
//! outcome back to [`ProgramService::settle`]. Saving (insert/update/delete
//! of whole rows) runs under the lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;

use tactivo_core::{
    compute_change_set, BoardLayout, ClientId, CompanyId, CoreError, Day, ExerciseId,
    ExerciseRef, MoveIntent, Placement, Program, ProgramExercise, ProgramKey, RowId, RowKey,
    WorkoutParams,
};
use tactivo_storage::{NewProgram, NewRow, ProgramRecord, ProgramStore, RowPatch, StoredRow};

use crate::error::ApiError;
use crate::persist::{BatchOutcome, PersistBatch, SettleReport};
use crate::schema::programs::MoveDirection;

/// Name given to the `n`-th program of a client (zero-based).
pub fn default_program_name(existing: usize) -> String {
    format!("Program {}", existing + 1)
}

/// In-memory program state of one client.
#[derive(Debug, Clone)]
pub struct ClientPrograms {
    pub company: CompanyId,
    pub programs: Vec<Program>,
    /// Programs as last loaded or saved.
    snapshot: Vec<Program>,
    generation: u64,
    /// Row -> generation of the batch that last dispatched it.
    in_flight: HashMap<RowId, u64>,
    pending_changes: bool,
}

impl ClientPrograms {
    fn new(company: CompanyId, programs: Vec<Program>) -> Self {
        ClientPrograms {
            company,
            snapshot: programs.clone(),
            programs,
            generation: 0,
            in_flight: HashMap::new(),
            pending_changes: false,
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending_changes
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn program(&self, key: ProgramKey) -> Result<&Program, ApiError> {
        self.programs
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| ApiError::NotFound(format!("program {}", key)))
    }

    fn program_mut(&mut self, key: ProgramKey) -> Result<&mut Program, ApiError> {
        self.programs
            .iter_mut()
            .find(|p| p.key == key)
            .ok_or_else(|| ApiError::NotFound(format!("program {}", key)))
    }

    fn snapshot_of(&self, key: ProgramKey) -> Option<&Program> {
        self.snapshot.iter().find(|p| p.key == key)
    }

    /// Normalizes a program and opens a batch for its pending placements.
    fn open_batch(&mut self, client: ClientId, key: ProgramKey) -> Result<PersistBatch, ApiError> {
        let changes = self.program_mut(key)?.normalize();
        self.pending_changes = true;
        self.generation += 1;
        for change in &changes {
            self.in_flight.insert(change.row, self.generation);
        }
        Ok(PersistBatch {
            client,
            program: key,
            generation: self.generation,
            changes,
            unsaved: self.pending_changes,
        })
    }

    /// True when any program differs from the snapshot.
    fn differs_from_snapshot(&self) -> bool {
        if self.programs.len() != self.snapshot.len() {
            return true;
        }
        self.programs.iter().any(|p| match self.snapshot_of(p.key) {
            None => true,
            Some(snap) => {
                snap.name != p.name
                    || snap.description != p.description
                    || !compute_change_set(Some(snap), p).is_clean()
            }
        })
    }
}

/// The central service coordinating program edits and persistence.
pub struct ProgramService {
    store: Arc<dyn ProgramStore>,
    clients: HashMap<ClientId, ClientPrograms>,
}

impl ProgramService {
    pub fn new(store: Arc<dyn ProgramStore>) -> Self {
        ProgramService {
            store,
            clients: HashMap::new(),
        }
    }

    pub fn store(&self) -> Arc<dyn ProgramStore> {
        Arc::clone(&self.store)
    }

    pub fn client(&self, client: ClientId) -> Result<&ClientPrograms, ApiError> {
        self.clients
            .get(&client)
            .ok_or_else(|| ApiError::NotFound(format!("no programs loaded for client {}", client)))
    }

    fn client_mut(&mut self, client: ClientId) -> Result<&mut ClientPrograms, ApiError> {
        self.clients
            .get_mut(&client)
            .ok_or_else(|| ApiError::NotFound(format!("no programs loaded for client {}", client)))
    }

    pub fn program(&self, client: ClientId, key: ProgramKey) -> Result<&Program, ApiError> {
        self.client(client)?.program(key)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    async fn fetch_programs(&self, records: &[ProgramRecord]) -> Result<Vec<Program>, ApiError> {
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        let mut by_program: HashMap<_, Vec<ProgramExercise>> = HashMap::new();
        for row in self.store.select_rows(&ids).await? {
            by_program
                .entry(row.program)
                .or_default()
                .push(row.into_program_exercise());
        }
        Ok(records
            .iter()
            .map(|r| {
                Program::hydrate(
                    ProgramKey::Persisted(r.id),
                    r.name.clone(),
                    r.description.clone(),
                    by_program.remove(&r.id).unwrap_or_default(),
                )
            })
            .collect())
    }

    /// Loads a client's programs from the store, replacing any local state.
    /// A client without programs gets one unsaved default program.
    pub async fn load_programs(
        &mut self,
        client: ClientId,
        company: CompanyId,
    ) -> Result<&ClientPrograms, ApiError> {
        let records = self.store.list_programs(client).await?;
        let mut programs = self.fetch_programs(&records).await?;
        if programs.is_empty() {
            programs.push(Program::new(ProgramKey::temp(), default_program_name(0)));
        }
        tracing::info!(%client, count = programs.len(), "programs loaded");
        self.clients
            .insert(client, ClientPrograms::new(company, programs));
        self.client(client)
    }

    // -----------------------------------------------------------------------
    // Program-level edits (local until saved)
    // -----------------------------------------------------------------------

    pub fn add_program(&mut self, client: ClientId) -> Result<&Program, ApiError> {
        let state = self.client_mut(client)?;
        let program = Program::new(
            ProgramKey::temp(),
            default_program_name(state.programs.len()),
        );
        state.programs.push(program);
        state.pending_changes = true;
        state
            .programs
            .last()
            .ok_or_else(|| ApiError::InternalError("program list empty after push".into()))
    }

    pub fn rename_program(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        name: &str,
    ) -> Result<&Program, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("program name must not be blank".into()));
        }
        let state = self.client_mut(client)?;
        state.pending_changes = true;
        let program = state.program_mut(key)?;
        program.name = name.to_string();
        Ok(&*program)
    }

    pub fn set_description(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        description: Option<String>,
    ) -> Result<&Program, ApiError> {
        let state = self.client_mut(client)?;
        state.pending_changes = true;
        let program = state.program_mut(key)?;
        program.description = description.filter(|d| !d.trim().is_empty());
        Ok(&*program)
    }

    /// Removes a program locally; the store forgets it on the next save.
    pub fn delete_program(&mut self, client: ClientId, key: ProgramKey) -> Result<(), ApiError> {
        let state = self.client_mut(client)?;
        let before = state.programs.len();
        state.programs.retain(|p| p.key != key);
        if state.programs.len() == before {
            return Err(ApiError::NotFound(format!("program {}", key)));
        }
        state.pending_changes = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Exercise edits (normalize + placement batch)
    // -----------------------------------------------------------------------

    /// Appends catalog exercises to a day. Ids missing from the company
    /// catalog are added as bare references.
    pub async fn add_exercises(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        exercise_ids: &[ExerciseId],
        day: Day,
    ) -> Result<(Vec<RowKey>, PersistBatch), ApiError> {
        let company = self.client(client)?.company;
        self.program(client, key)?;
        let catalog: HashMap<ExerciseId, ExerciseRef> = self
            .store
            .list_exercises(company)
            .await?
            .iter()
            .map(|record| (record.id, record.to_ref()))
            .collect();
        let refs = exercise_ids
            .iter()
            .map(|id| {
                catalog
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| ExerciseRef::bare(*id))
            })
            .collect();

        let state = self.client_mut(client)?;
        let keys = state.program_mut(key)?.add_exercises(refs, day)?;
        let batch = state.open_batch(client, key)?;
        Ok((keys, batch))
    }

    /// Removes a row. Persisted rows are deleted from the store first; if
    /// that fails, local state is left untouched.
    pub async fn remove_exercise(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        row: RowKey,
    ) -> Result<PersistBatch, ApiError> {
        self.program(client, key)?
            .find(&row)
            .ok_or(CoreError::ExerciseNotFound { key: row })?;

        if let Some(id) = row.row_id() {
            self.store.delete_rows(&[id]).await?;
        }

        let state = self.client_mut(client)?;
        state.program_mut(key)?.remove_exercise(&row)?;
        if let Some(id) = row.row_id() {
            state.in_flight.remove(&id);
            for snap in state.snapshot.iter_mut().filter(|p| p.key == key) {
                snap.exercises.retain(|pe| pe.key != row);
            }
        }
        state.open_batch(client, key)
    }

    pub fn move_exercise(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        row: RowKey,
        direction: MoveDirection,
    ) -> Result<PersistBatch, ApiError> {
        let state = self.client_mut(client)?;
        let program = state.program_mut(key)?;
        match direction {
            MoveDirection::Up => program.move_up(&row)?,
            MoveDirection::Down => program.move_down(&row)?,
        };
        state.open_batch(client, key)
    }

    pub fn update_params(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        row: RowKey,
        params: WorkoutParams,
    ) -> Result<&ProgramExercise, ApiError> {
        let state = self.client_mut(client)?;
        state.pending_changes = true;
        let program = state.program_mut(key)?;
        program.update_params(&row, params)?;
        program
            .find(&row)
            .ok_or_else(|| CoreError::ExerciseNotFound { key: row }.into())
    }

    /// Declares a new empty day column. Nothing moves, so nothing is sent.
    pub fn add_day(&mut self, client: ClientId, key: ProgramKey) -> Result<Day, ApiError> {
        let state = self.client_mut(client)?;
        let day = state.program_mut(key)?.add_day()?;
        state.pending_changes = true;
        Ok(day)
    }

    /// Drops a day and its rows; remaining days are compacted.
    pub fn delete_day(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        day: Day,
    ) -> Result<PersistBatch, ApiError> {
        let state = self.client_mut(client)?;
        let removed = state.program_mut(key)?.delete_day(day)?;
        for id in removed.iter().filter_map(|pe| pe.key.row_id()) {
            state.in_flight.remove(&id);
        }
        state.open_batch(client, key)
    }

    /// Renormalizes a program, optionally replacing its rows first.
    ///
    /// Persisted rows in the replacement list must already belong to the
    /// program and keys must be unique. Sync state always comes from the
    /// current rows, never from the list.
    pub fn update_positions(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        exercises: Option<Vec<ProgramExercise>>,
    ) -> Result<PersistBatch, ApiError> {
        let state = self.client_mut(client)?;
        if let Some(mut list) = exercises {
            let program = state.program_mut(key)?;
            let known: HashMap<RowKey, (Option<Placement>, bool)> = program
                .exercises
                .iter()
                .map(|pe| (pe.key, (pe.confirmed, pe.failed)))
                .collect();
            let mut seen = HashSet::new();
            for pe in &mut list {
                if !seen.insert(pe.key) {
                    return Err(ApiError::BadRequest(format!(
                        "row {} appears more than once",
                        pe.key
                    )));
                }
                match (pe.key.is_temp(), known.get(&pe.key)) {
                    (_, Some((confirmed, failed))) => {
                        pe.confirmed = *confirmed;
                        pe.failed = *failed;
                    }
                    (true, None) => {
                        pe.confirmed = None;
                        pe.failed = false;
                    }
                    (false, None) => {
                        return Err(ApiError::BadRequest(format!(
                            "row {} does not belong to program {}",
                            pe.key, key
                        )));
                    }
                }
            }
            program.exercises = list;
        }
        state.open_batch(client, key)
    }

    /// Puts every persisted row back where the store last confirmed it.
    pub fn revert_program(
        &mut self,
        client: ClientId,
        key: ProgramKey,
    ) -> Result<PersistBatch, ApiError> {
        let state = self.client_mut(client)?;
        state.program_mut(key)?.revert_to_confirmed();
        state.open_batch(client, key)
    }

    pub fn board_layout(&self, client: ClientId, key: ProgramKey) -> Result<BoardLayout, ApiError> {
        Ok(BoardLayout::from_program(self.program(client, key)?))
    }

    /// Applies a drag intent to the current program.
    pub fn apply_move(
        &mut self,
        client: ClientId,
        key: ProgramKey,
        intent: &MoveIntent,
    ) -> Result<PersistBatch, ApiError> {
        let state = self.client_mut(client)?;
        let program = state.program_mut(key)?;
        let layout = BoardLayout::from_program(program)
            .apply(intent)
            .ok_or_else(|| ApiError::Conflict("drag target no longer exists".into()))?;
        program.arrange(&layout);
        state.open_batch(client, key)
    }

    /// Folds a dispatched batch back into the in-memory rows.
    pub fn settle(&mut self, outcome: BatchOutcome) -> SettleReport {
        let mut report = SettleReport {
            sent: outcome.results.len(),
            ..SettleReport::default()
        };
        let Some(state) = self.clients.get_mut(&outcome.client) else {
            report.stale = report.sent;
            return report;
        };

        for row_result in outcome.results {
            let row = row_result.change.row;
            if state.in_flight.get(&row) != Some(&outcome.generation) {
                tracing::debug!(%row, generation = outcome.generation, "ignoring stale placement response");
                report.stale += 1;
                continue;
            }
            state.in_flight.remove(&row);

            let key = RowKey::Persisted(row);
            let Some(pe) = state
                .programs
                .iter_mut()
                .flat_map(|p| p.exercises.iter_mut())
                .find(|pe| pe.key == key)
            else {
                report.stale += 1;
                continue;
            };

            match row_result.result {
                Ok(()) => {
                    pe.confirm(row_result.change.to);
                    report.confirmed += 1;
                }
                Err(err) => {
                    tracing::warn!(%row, program = %outcome.program, error = %err, "placement update failed");
                    pe.mark_failed();
                    report.failed.push(row);
                }
            }
        }
        report
    }

    // -----------------------------------------------------------------------
    // Save flow
    // -----------------------------------------------------------------------

    /// Writes one program to the store: header, deletions, updates, then
    /// inserts. The program is reloaded afterwards and becomes clean.
    /// Returns the program's (possibly new) key.
    pub async fn persist_program(
        &mut self,
        client: ClientId,
        key: ProgramKey,
    ) -> Result<ProgramKey, ApiError> {
        let store = Arc::clone(&self.store);
        let state = self.client_mut(client)?;
        state.program_mut(key)?.normalize();
        let current = state.program(key)?.clone();
        let snapshot = state.snapshot_of(key).cloned();

        let program_id = match current.key {
            ProgramKey::Persisted(id) => {
                let renamed = snapshot.as_ref().map_or(true, |s| {
                    s.name != current.name || s.description != current.description
                });
                if renamed {
                    store
                        .update_program(&ProgramRecord {
                            id,
                            client,
                            name: current.name.clone(),
                            description: current.description.clone(),
                        })
                        .await?;
                }
                id
            }
            ProgramKey::Temp(_) => {
                let id = store
                    .insert_program(NewProgram {
                        client,
                        name: current.name.clone(),
                        description: current.description.clone(),
                    })
                    .await?
                    .id;
                // A retry after a later failure must not insert the program twice.
                state.program_mut(key)?.key = ProgramKey::Persisted(id);
                id
            }
        };
        let new_key = ProgramKey::Persisted(program_id);

        let changes = compute_change_set(snapshot.as_ref(), &current);
        store.delete_rows(&changes.deletions).await?;

        let updates = changes.updates.iter().map(|u| {
            store.update_row(
                u.row,
                RowPatch {
                    exercise: u.exercise,
                    placement: u.placement,
                    params: u.params.clone(),
                },
            )
        });
        join_all(updates)
            .await
            .into_iter()
            .collect::<Result<Vec<()>, _>>()?;

        let new_rows: Vec<NewRow> = changes
            .inserts
            .iter()
            .map(|pe| NewRow::from_program_exercise(program_id, pe))
            .collect();
        let inserted: Vec<StoredRow> = if new_rows.is_empty() {
            Vec::new()
        } else {
            store.insert_rows(new_rows).await?
        };

        {
            let program = state.program_mut(new_key)?;
            for (local, stored) in changes.inserts.iter().zip(&inserted) {
                if let Some(pe) = program.find_mut(&local.key) {
                    pe.promote(stored.id)?;
                }
            }
        }

        let rows = store.select_rows(&[program_id]).await?;
        let reloaded = Program::hydrate(
            new_key,
            current.name.clone(),
            current.description.clone(),
            rows.into_iter().map(StoredRow::into_program_exercise).collect(),
        );
        for pe in &reloaded.exercises {
            if let Some(id) = pe.key.row_id() {
                state.in_flight.remove(&id);
            }
        }
        *state.program_mut(new_key)? = reloaded.clone();
        state.snapshot.retain(|p| p.key != key && p.key != new_key);
        state.snapshot.push(reloaded);
        state.pending_changes = state.differs_from_snapshot();

        tracing::info!(
            %client,
            program = %new_key,
            inserts = changes.inserts.len(),
            updates = changes.updates.len(),
            deletions = changes.deletions.len(),
            "program saved"
        );
        Ok(new_key)
    }

    /// Saves every program of a client, deleting those removed locally.
    pub async fn persist_all(&mut self, client: ClientId) -> Result<(), ApiError> {
        let store = Arc::clone(&self.store);
        let state = self.client_mut(client)?;
        let removed: Vec<_> = state
            .snapshot
            .iter()
            .filter_map(|p| p.key.program_id())
            .filter(|id| !state.programs.iter().any(|p| p.key.program_id() == Some(*id)))
            .collect();
        store.delete_programs(&removed).await?;
        state
            .snapshot
            .retain(|p| p.key.program_id().map_or(true, |id| !removed.contains(&id)));

        let keys: Vec<ProgramKey> = state.programs.iter().map(|p| p.key).collect();
        for key in keys {
            self.persist_program(client, key).await?;
        }

        let state = self.client_mut(client)?;
        state.snapshot = state.programs.clone();
        state.pending_changes = false;
        Ok(())
    }

    /// Discards local edits and restores the last loaded or saved state.
    pub fn reset_to_initial(&mut self, client: ClientId) -> Result<&ClientPrograms, ApiError> {
        let state = self.client_mut(client)?;
        state.programs = state.snapshot.clone();
        state.in_flight.clear();
        state.generation += 1;
        state.pending_changes = false;
        Ok(&*state)
    }

    pub fn has_pending_changes(&self, client: ClientId) -> Result<bool, ApiError> {
        Ok(self.client(client)?.has_pending_changes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactivo_core::{Placement, SyncState};
    use tactivo_storage::{InMemoryStore, NewExercise};

    const CLIENT: ClientId = ClientId(7);
    const COMPANY: CompanyId = CompanyId(1);

    fn row_key(id: RowId) -> RowKey {
        RowKey::Persisted(id)
    }

    /// A store holding one program with rows at A/0, A/1, A/2.
    async fn seeded() -> (Arc<InMemoryStore>, ProgramService, ProgramKey, Vec<RowId>) {
        let mem = Arc::new(InMemoryStore::new());
        let program = mem
            .insert_program(NewProgram {
                client: CLIENT,
                name: "Strength".into(),
                description: None,
            })
            .await
            .unwrap();
        let rows = mem
            .insert_rows(
                (0..3)
                    .map(|i| NewRow {
                        program: program.id,
                        exercise: ExerciseId(i + 1),
                        placement: Placement::new(Day::A, i as u32),
                        params: WorkoutParams::default(),
                    })
                    .collect(),
            )
            .await
            .unwrap();
        let store: Arc<dyn ProgramStore> = mem.clone();
        let mut service = ProgramService::new(store);
        service.load_programs(CLIENT, COMPANY).await.unwrap();
        (
            mem,
            service,
            ProgramKey::Persisted(program.id),
            rows.iter().map(|r| r.id).collect(),
        )
    }

    fn placement(service: &ProgramService, key: ProgramKey, row: RowId) -> &ProgramExercise {
        service
            .program(CLIENT, key)
            .unwrap()
            .find(&row_key(row))
            .unwrap()
    }

    #[tokio::test]
    async fn client_without_programs_gets_a_default_one() {
        let store: Arc<dyn ProgramStore> = Arc::new(InMemoryStore::new());
        let mut service = ProgramService::new(store);
        let state = service.load_programs(CLIENT, COMPANY).await.unwrap();
        assert_eq!(state.programs.len(), 1);
        assert_eq!(state.programs[0].name, "Program 1");
        assert!(state.programs[0].key.is_temp());
        assert_eq!(state.programs[0].days, vec![Day::A]);
        assert!(!state.has_pending_changes());
    }

    #[tokio::test]
    async fn unknown_client_or_program_is_not_found() {
        let (_, mut service, _, _) = seeded().await;
        assert!(matches!(
            service.add_day(ClientId(99), ProgramKey::temp()),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.add_day(CLIENT, ProgramKey::temp()),
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn batch_confirms_successful_rows() {
        let (mem, mut service, key, rows) = seeded().await;
        let batch = service
            .move_exercise(CLIENT, key, row_key(rows[0]), MoveDirection::Down)
            .unwrap();
        assert_eq!(batch.changes.len(), 2);
        assert_eq!(
            placement(&service, key, rows[0]).sync_state(),
            SyncState::Pending
        );

        let outcome = batch.dispatch(&service.store()).await;
        let report = service.settle(outcome);

        assert_eq!(report.confirmed, 2);
        assert!(report.failed.is_empty());
        assert_eq!(
            placement(&service, key, rows[0]).sync_state(),
            SyncState::Confirmed
        );
        assert_eq!(mem.placement_of(rows[0]), Some(Placement::new(Day::A, 1)));
    }

    #[tokio::test]
    async fn failed_rows_stay_pending_and_flagged() {
        let (mem, mut service, key, rows) = seeded().await;
        mem.reject_row(rows[1], "offline");

        let batch = service
            .move_exercise(CLIENT, key, row_key(rows[0]), MoveDirection::Down)
            .unwrap();
        let outcome = batch.dispatch(&service.store()).await;
        let report = service.settle(outcome);

        assert_eq!(report.failed, vec![rows[1]]);
        assert_eq!(report.confirmed, 1);
        assert_eq!(
            placement(&service, key, rows[1]).sync_state(),
            SyncState::Failed
        );
        assert_eq!(
            placement(&service, key, rows[0]).sync_state(),
            SyncState::Confirmed
        );
    }

    #[tokio::test]
    async fn stale_responses_are_fenced_by_generation() {
        let (_, mut service, key, rows) = seeded().await;
        let first = service
            .move_exercise(CLIENT, key, row_key(rows[0]), MoveDirection::Down)
            .unwrap();
        let second = service
            .move_exercise(CLIENT, key, row_key(rows[0]), MoveDirection::Down)
            .unwrap();
        assert!(second.generation > first.generation);

        let store = service.store();
        let newer = second.dispatch(&store).await;
        let older = first.dispatch(&store).await;

        let report = service.settle(newer);
        assert_eq!(report.confirmed, 3);
        let report = service.settle(older);
        assert_eq!(report.stale, 2);
        assert_eq!(report.confirmed, 0);

        let moved = placement(&service, key, rows[0]);
        assert_eq!(moved.placement, Placement::new(Day::A, 2));
        assert_eq!(moved.confirmed, Some(Placement::new(Day::A, 2)));
    }

    #[tokio::test]
    async fn revert_restores_confirmed_order() {
        let (mem, mut service, key, rows) = seeded().await;
        mem.reject_row(rows[0], "offline");
        mem.reject_row(rows[1], "offline");
        let batch = service
            .move_exercise(CLIENT, key, row_key(rows[0]), MoveDirection::Down)
            .unwrap();
        let outcome = batch.dispatch(&service.store()).await;
        service.settle(outcome);

        let batch = service.revert_program(CLIENT, key).unwrap();
        assert!(batch.is_empty());
        assert_eq!(placement(&service, key, rows[0]).placement.position, 0);
        assert_eq!(placement(&service, key, rows[1]).placement.position, 1);
        assert_eq!(
            placement(&service, key, rows[0]).sync_state(),
            SyncState::Confirmed
        );
    }

    #[tokio::test]
    async fn add_exercises_uses_catalog_and_sends_nothing() {
        let (mem, mut service, key, _) = seeded().await;
        let squat = mem
            .insert_exercise(NewExercise {
                company: COMPANY,
                name: "Squat".into(),
                description: Some("Back straight".into()),
                file: None,
            })
            .await
            .unwrap();

        let (keys, batch) = service
            .add_exercises(CLIENT, key, &[squat.id, ExerciseId(500)], Day::A)
            .await
            .unwrap();

        assert!(batch.is_empty());
        assert!(batch.unsaved);
        let program = service.program(CLIENT, key).unwrap();
        let added = program.find(&keys[0]).unwrap();
        assert_eq!(added.placement.position, 3);
        assert_eq!(added.params.notes.as_deref(), Some("Back straight"));
        assert_eq!(program.find(&keys[1]).unwrap().exercise.name, None);
    }

    #[tokio::test]
    async fn remove_persisted_row_deletes_remotely() {
        let (mem, mut service, key, rows) = seeded().await;
        let batch = service
            .remove_exercise(CLIENT, key, row_key(rows[0]))
            .await
            .unwrap();
        assert_eq!(batch.changes.len(), 2);
        assert_eq!(mem.placement_of(rows[0]), None);
        assert_eq!(placement(&service, key, rows[1]).placement.position, 0);
    }

    #[tokio::test]
    async fn persist_program_inserts_and_reloads() {
        let (mem, mut service, key, rows) = seeded().await;
        let (keys, _) = service
            .add_exercises(CLIENT, key, &[ExerciseId(9)], Day::A)
            .await
            .unwrap();
        service
            .update_params(
                CLIENT,
                key,
                row_key(rows[2]),
                WorkoutParams {
                    reps: Some(12),
                    ..WorkoutParams::default()
                },
            )
            .unwrap();
        assert!(service.has_pending_changes(CLIENT).unwrap());

        let saved = service.persist_program(CLIENT, key).await.unwrap();

        assert_eq!(saved, key);
        assert!(!service.has_pending_changes(CLIENT).unwrap());
        let program = service.program(CLIENT, key).unwrap();
        assert_eq!(program.exercises.len(), 4);
        assert!(program.exercises.iter().all(|pe| !pe.key.is_temp()));
        assert!(program.find(&keys[0]).is_none());
        let stored = mem.select_rows(&[key.program_id().unwrap()]).await.unwrap();
        assert_eq!(stored[2].params.reps, Some(12));
        assert_eq!(stored[3].placement.position, 3);
    }

    #[tokio::test]
    async fn persist_all_saves_new_and_deletes_removed_programs() {
        let (mem, mut service, key, _) = seeded().await;
        let added = service.add_program(CLIENT).unwrap().key;
        service.rename_program(CLIENT, added, "Mobility").unwrap();
        service.delete_program(CLIENT, key).unwrap();

        service.persist_all(CLIENT).await.unwrap();

        let stored = mem.list_programs(CLIENT).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Mobility");
        let state = service.client(CLIENT).unwrap();
        assert!(!state.has_pending_changes());
        assert!(state.programs.iter().all(|p| !p.key.is_temp()));
    }

    #[tokio::test]
    async fn reset_discards_local_edits() {
        let (_, mut service, key, _) = seeded().await;
        service.add_program(CLIENT).unwrap();
        service.delete_day(CLIENT, key, Day::A).unwrap();

        let state = service.reset_to_initial(CLIENT).unwrap();
        assert_eq!(state.programs.len(), 1);
        assert_eq!(state.programs[0].exercises.len(), 3);
        assert!(!state.has_pending_changes());
    }

    #[tokio::test]
    async fn blank_program_names_are_rejected() {
        let (_, mut service, key, _) = seeded().await;
        assert!(matches!(
            service.rename_program(CLIENT, key, "   "),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn explicit_list_rejects_rows_of_other_programs() {
        let (mem, mut service, key, _) = seeded().await;
        let other = mem
            .insert_program(NewProgram {
                client: ClientId(8),
                name: "Other".into(),
                description: None,
            })
            .await
            .unwrap();
        let foreign = mem
            .insert_rows(vec![NewRow {
                program: other.id,
                exercise: ExerciseId(1),
                placement: Placement::new(Day::A, 0),
                params: WorkoutParams::default(),
            }])
            .await
            .unwrap()[0]
            .id;

        let mut list = service.program(CLIENT, key).unwrap().exercises.clone();
        list.push(ProgramExercise::from_stored(
            foreign,
            ExerciseRef::bare(ExerciseId(1)),
            Placement::new("C".parse().unwrap(), 5),
            WorkoutParams::default(),
        ));

        assert!(matches!(
            service.update_positions(CLIENT, key, Some(list)),
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(service.program(CLIENT, key).unwrap().exercises.len(), 3);
        assert!(mem.placement_writes().is_empty());
        assert_eq!(mem.placement_of(foreign), Some(Placement::new(Day::A, 0)));
    }

    #[tokio::test]
    async fn explicit_list_rejects_duplicate_keys() {
        let (_, mut service, key, _) = seeded().await;
        let mut list = service.program(CLIENT, key).unwrap().exercises.clone();
        list.push(list[0].clone());

        assert!(matches!(
            service.update_positions(CLIENT, key, Some(list)),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn explicit_list_keeps_stored_sync_state() {
        let (_, mut service, key, rows) = seeded().await;
        let mut list = service.program(CLIENT, key).unwrap().exercises.clone();
        let moved = list
            .iter_mut()
            .find(|pe| pe.key == row_key(rows[0]))
            .unwrap();
        moved.placement = Placement::new(Day::A, 9);
        moved.confirmed = Some(moved.placement);
        moved.failed = true;

        let batch = service.update_positions(CLIENT, key, Some(list)).unwrap();

        assert!(batch.changes.iter().any(|c| c.row == rows[0]));
        let pe = placement(&service, key, rows[0]);
        assert_eq!(pe.placement, Placement::new(Day::A, 2));
        assert_eq!(pe.confirmed, Some(Placement::new(Day::A, 0)));
        assert!(!pe.failed);
    }

    #[tokio::test]
    async fn failed_save_of_new_program_is_not_inserted_twice() {
        let (mem, mut service, _, _) = seeded().await;
        let temp = service.add_program(CLIENT).unwrap().key;
        service
            .add_exercises(CLIENT, temp, &[ExerciseId(1)], Day::A)
            .await
            .unwrap();
        mem.reject_inserts("offline");

        assert!(matches!(
            service.persist_program(CLIENT, temp).await,
            Err(ApiError::Conflict(_))
        ));
        let promoted = service.client(CLIENT).unwrap().programs[1].key;
        assert!(!promoted.is_temp());

        mem.accept_inserts();
        let saved = service.persist_program(CLIENT, promoted).await.unwrap();
        assert_eq!(saved, promoted);
        assert_eq!(mem.list_programs(CLIENT).await.unwrap().len(), 2);
        let rows = mem.select_rows(&[saved.program_id().unwrap()]).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
