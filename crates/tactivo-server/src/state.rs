//! Application state shared by all handlers.
//!
//! [`AppState`] wraps the service in `Arc<tokio::sync::Mutex<>>` so handlers
//! await the lock without blocking the runtime. The row store, the drag
//! sessions and the notifier sit beside it and are reached without the lock:
//! placement batches are dispatched straight to the store, and hover traffic
//! only touches its own `DashMap`.

use std::sync::Arc;
use std::time::Duration;

use tactivo_storage::{InMemoryStore, ProgramStore, SqliteStore};

use crate::config::ServerConfig;
use crate::drag::DragSessions;
use crate::error::ApiError;
use crate::notify::Notifier;
use crate::service::ProgramService;

/// How often expired notifications are swept.
const TOAST_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// The shared program service (async Mutex -- non-blocking await).
    pub service: Arc<tokio::sync::Mutex<ProgramService>>,
    /// Row store used to dispatch placement batches outside the lock.
    pub store: Arc<dyn ProgramStore>,
    /// Active drag sessions, advanced by the frame pump.
    pub drags: Arc<DragSessions>,
    /// Transient save/error notifications.
    pub notifier: Arc<Notifier>,
}

impl AppState {
    /// Creates an `AppState` backed by the SQLite database in `config`.
    pub fn new(config: &ServerConfig) -> Result<Self, ApiError> {
        let store = SqliteStore::new(&config.db_path)
            .map_err(|e| ApiError::InternalError(format!("failed to open store: {}", e)))?;
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Creates an `AppState` with an in-memory store (for testing).
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()), &ServerConfig::default())
    }

    /// Creates an `AppState` over any store and starts the background tasks.
    pub fn with_store(store: Arc<dyn ProgramStore>, config: &ServerConfig) -> Self {
        let drags = Arc::new(DragSessions::new());
        let notifier = Arc::new(Notifier::new(config.toast_ttl));

        drags.start_frame_pump(config.frame_interval);
        notifier.start_expiry_sweep(TOAST_SWEEP_INTERVAL);

        AppState {
            service: Arc::new(tokio::sync::Mutex::new(ProgramService::new(Arc::clone(
                &store,
            )))),
            store,
            drags,
            notifier,
        }
    }
}
