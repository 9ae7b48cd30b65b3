//! Single-slot coalescing buffer.
//!
//! Pointer hovers arrive far more often than they can be applied. Each offer
//! replaces whatever is waiting, so a drain sees only the most recent value.

/// Holds at most one pending value; newer offers overwrite older ones.
#[derive(Debug, Clone)]
pub struct LatestSlot<T> {
    slot: Option<T>,
    superseded: u64,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        LatestSlot {
            slot: None,
            superseded: 0,
        }
    }

    /// Stores `value`, returning `true` if it replaced an undrained one.
    pub fn offer(&mut self, value: T) -> bool {
        let replaced = self.slot.replace(value).is_some();
        if replaced {
            self.superseded += 1;
        }
        replaced
    }

    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }

    pub fn peek(&self) -> Option<&T> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// How many offers were dropped without ever being drained.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    pub fn clear(&mut self) {
        self.slot = None;
        self.superseded = 0;
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
