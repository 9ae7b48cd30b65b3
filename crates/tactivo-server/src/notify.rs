//! Transient notifications ("toasts") reporting persistence outcomes.
//!
//! Pushing is fire-and-forget. Each toast lives for the configured TTL;
//! expired toasts are filtered out of [`Notifier::active`] and removed by the
//! background sweep.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use tactivo_core::{ClientId, ProgramKey};

pub const ORDER_SAVED: &str = "Order saved";
pub const ORDER_SAVE_FAILED: &str = "Could not save the new order";
pub const ORDER_PENDING: &str = "Order updated (pending save)";
pub const CHANGES_SAVED: &str = "Changes saved";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Saved,
    Error,
    Pending,
}

#[derive(Debug, Clone)]
struct Toast {
    id: u64,
    kind: ToastKind,
    title: String,
    client: ClientId,
    program: Option<ProgramKey>,
    expires_at: Instant,
}

/// A toast as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ToastView {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub client: ClientId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<ProgramKey>,
    pub remaining_ms: u64,
}

pub struct Notifier {
    toasts: Mutex<VecDeque<Toast>>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Notifier {
            toasts: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            ttl,
        }
    }

    fn toasts(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a toast and returns its id.
    pub fn push(
        &self,
        kind: ToastKind,
        title: impl Into<String>,
        client: ClientId,
        program: Option<ProgramKey>,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let title = title.into();
        tracing::debug!(id, ?kind, %title, "toast");
        self.toasts().push_back(Toast {
            id,
            kind,
            title,
            client,
            program,
            expires_at: Instant::now() + self.ttl,
        });
        id
    }

    /// Toasts that have not yet expired, oldest first.
    pub fn active(&self) -> Vec<ToastView> {
        let now = Instant::now();
        self.toasts()
            .iter()
            .filter(|t| t.expires_at > now)
            .map(|t| ToastView {
                id: t.id,
                kind: t.kind,
                title: t.title.clone(),
                client: t.client,
                program: t.program,
                remaining_ms: (t.expires_at - now).as_millis() as u64,
            })
            .collect()
    }

    /// Drops expired toasts, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut toasts = self.toasts();
        let before = toasts.len();
        toasts.retain(|t| t.expires_at > now);
        before - toasts.len()
    }

    /// Spawns a background task that sweeps expired toasts every `interval`.
    pub fn start_expiry_sweep(self: &Arc<Self>, interval: Duration) {
        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            loop {
                tick.tick().await;
                let removed = notifier.sweep_expired();
                if removed > 0 {
                    tracing::debug!("Swept {} expired toast(s)", removed);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_ttl() {
        let notifier = Notifier::new(Duration::from_millis(0));
        notifier.push(ToastKind::Saved, ORDER_SAVED, ClientId(1), None);
        assert!(notifier.active().is_empty());
        assert_eq!(notifier.sweep_expired(), 1);
    }

    #[test]
    fn active_keeps_push_order() {
        let notifier = Notifier::new(Duration::from_secs(60));
        let first = notifier.push(ToastKind::Pending, ORDER_PENDING, ClientId(1), None);
        let second = notifier.push(ToastKind::Error, ORDER_SAVE_FAILED, ClientId(2), None);
        let active = notifier.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, first);
        assert_eq!(active[1].id, second);
        assert_eq!(active[1].kind, ToastKind::Error);
        assert_eq!(notifier.sweep_expired(), 0);
    }
}
