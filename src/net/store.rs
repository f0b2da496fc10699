//! Abstract shared room store
//!
//! The game only needs five primitives from its backend: overwrite, one-shot
//! read, change subscription, atomic read-modify-write and delete. Partial
//! updates and score increments are built on the transaction.

use std::rc::Rc;

use super::room::{RoomCode, RoomPatch, RoomRecord, ScoreField};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("room record could not be encoded: {0}")]
    Serialization(String),
    #[error("room {0} does not exist")]
    MissingRoom(String),
}

/// Change callback. Receives `None` once the room is deleted.
pub type RoomCallback = Rc<dyn Fn(Option<&RoomRecord>)>;

/// Live subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub trait RoomStore {
    /// Unconditional overwrite of the whole record
    fn write(&self, code: &RoomCode, record: &RoomRecord) -> Result<(), StoreError>;

    /// One-shot fetch
    fn read_once(&self, code: &RoomCode) -> Result<Option<RoomRecord>, StoreError>;

    /// Invoke `callback` with the current value now and after every change
    fn subscribe(&self, code: &RoomCode, callback: RoomCallback)
    -> Result<Subscription, StoreError>;

    /// Atomic read-modify-write. `apply` returns false to abort.
    /// Returns the committed record, or `None` if the room is missing or the
    /// transaction aborted.
    fn transact(
        &self,
        code: &RoomCode,
        apply: &mut dyn FnMut(&mut RoomRecord) -> bool,
    ) -> Result<Option<RoomRecord>, StoreError>;

    fn remove(&self, code: &RoomCode) -> Result<(), StoreError>;

    /// Overwrite the fields set in `patch`
    fn update(&self, code: &RoomCode, patch: &RoomPatch) -> Result<(), StoreError> {
        self.transact(code, &mut |record: &mut RoomRecord| {
            patch.apply(record);
            true
        })?
        .map(|_| ())
        .ok_or_else(|| StoreError::MissingRoom(code.to_string()))
    }

    /// Add `delta` to a score field without losing concurrent updates.
    /// Returns the value that was committed.
    fn atomic_increment(
        &self,
        code: &RoomCode,
        field: ScoreField,
        delta: u32,
    ) -> Result<u32, StoreError> {
        self.transact(code, &mut |record: &mut RoomRecord| {
            let slot = record.score_field_mut(field);
            *slot = slot.saturating_add(delta);
            true
        })?
        .map(|record| record.score_field(field))
        .ok_or_else(|| StoreError::MissingRoom(code.to_string()))
    }
}
