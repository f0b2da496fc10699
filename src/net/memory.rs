//! In-process room store
//!
//! Clones share the same rooms, so two `App`s holding clones behave like two
//! clients of one backend. Notifications are delivered synchronously, after
//! the store's own borrow is released, so callbacks may call back into it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::room::{RoomCode, RoomRecord};
use super::store::{RoomCallback, RoomStore, StoreError, Subscription};

struct Watcher {
    id: u64,
    code: RoomCode,
    callback: RoomCallback,
}

#[derive(Default)]
struct Inner {
    rooms: HashMap<RoomCode, RoomRecord>,
    watchers: Vec<Watcher>,
    next_watcher_id: u64,
    offline: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage: every call fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    pub fn room_count(&self) -> usize {
        self.inner.borrow().rooms.len()
    }

    /// Number of live subscriptions across all rooms
    pub fn watcher_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.inner.borrow().offline {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn notify(&self, code: &RoomCode) {
        let (record, callbacks) = {
            let inner = self.inner.borrow();
            let callbacks: Vec<RoomCallback> = inner
                .watchers
                .iter()
                .filter(|w| &w.code == code)
                .map(|w| w.callback.clone())
                .collect();
            (inner.rooms.get(code).cloned(), callbacks)
        };
        for callback in callbacks {
            callback(record.as_ref());
        }
    }
}

impl RoomStore for MemoryStore {
    fn write(&self, code: &RoomCode, record: &RoomRecord) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.inner
            .borrow_mut()
            .rooms
            .insert(code.clone(), record.clone());
        self.notify(code);
        Ok(())
    }

    fn read_once(&self, code: &RoomCode) -> Result<Option<RoomRecord>, StoreError> {
        self.ensure_online()?;
        Ok(self.inner.borrow().rooms.get(code).cloned())
    }

    fn subscribe(
        &self,
        code: &RoomCode,
        callback: RoomCallback,
    ) -> Result<Subscription, StoreError> {
        self.ensure_online()?;
        let (id, current) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_watcher_id;
            inner.next_watcher_id += 1;
            inner.watchers.push(Watcher {
                id,
                code: code.clone(),
                callback: callback.clone(),
            });
            (id, inner.rooms.get(code).cloned())
        };
        callback(current.as_ref());

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().watchers.retain(|w| w.id != id);
            }
        }))
    }

    fn transact(
        &self,
        code: &RoomCode,
        apply: &mut dyn FnMut(&mut RoomRecord) -> bool,
    ) -> Result<Option<RoomRecord>, StoreError> {
        self.ensure_online()?;
        let committed = {
            let mut inner = self.inner.borrow_mut();
            let Some(record) = inner.rooms.get_mut(code) else {
                return Ok(None);
            };
            let mut draft = record.clone();
            if !apply(&mut draft) {
                return Ok(None);
            }
            *record = draft.clone();
            draft
        };
        self.notify(code);
        Ok(Some(committed))
    }

    fn remove(&self, code: &RoomCode) -> Result<(), StoreError> {
        self.ensure_online()?;
        let existed = self.inner.borrow_mut().rooms.remove(code).is_some();
        if existed {
            self.notify(code);
        }
        Ok(())
    }
}
