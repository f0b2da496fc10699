//! LocalStorage-backed room store
//!
//! Every field of a room lives under its own key, `rooms/CODE/<field>`, so
//! every tab of the same origin sees the same rooms. Writes made by other
//! tabs arrive through the window `storage` event; writes made here notify
//! local watchers directly.
//!
//! A transaction writes back only the fields it changed. Each field has a
//! single writer during a match: the host owns the ball, its paddle and both
//! scores, the guest owns its paddle and the join claim. A stale copy in one
//! tab therefore never overwrites another tab's field, and score increments
//! stay atomic because they all run in the host tab.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Storage, StorageEvent};

use super::room::{FieldEntry, RECORD_FIELDS, RoomCode, RoomRecord};
use super::store::{RoomCallback, RoomStore, StoreError, Subscription};

const KEY_PREFIX: &str = "rooms/";

/// Written last and removed first
const PRESENCE_FIELD: &str = "players";

struct Watcher {
    id: u64,
    code: RoomCode,
    callback: RoomCallback,
}

#[derive(Default)]
struct Watchers {
    list: Vec<Watcher>,
    next_id: u64,
}

impl Watchers {
    fn callbacks_for(&self, code: &RoomCode) -> Vec<RoomCallback> {
        self.list
            .iter()
            .filter(|w| &w.code == code)
            .map(|w| w.callback.clone())
            .collect()
    }
}

fn notify(watchers: &RefCell<Watchers>, code: &RoomCode, record: Option<&RoomRecord>) {
    // Release the borrow before calling out
    let callbacks = watchers.borrow().callbacks_for(code);
    for callback in callbacks {
        callback(record);
    }
}

fn js_error(err: JsValue) -> StoreError {
    StoreError::Unavailable(format!("{err:?}"))
}

fn encode_error(err: serde_json::Error) -> StoreError {
    StoreError::Serialization(err.to_string())
}

fn field_key(code: &RoomCode, field: &str) -> String {
    format!("{}/{}", code.storage_key(), field)
}

fn load(storage: &Storage, code: &RoomCode) -> Result<Option<RoomRecord>, StoreError> {
    if storage
        .get_item(&field_key(code, PRESENCE_FIELD))
        .map_err(js_error)?
        .is_none()
    {
        return Ok(None);
    }
    let mut fields = Vec::with_capacity(RECORD_FIELDS.len());
    for field in RECORD_FIELDS {
        let json = storage
            .get_item(&field_key(code, field))
            .map_err(js_error)?
            .ok_or_else(|| {
                StoreError::Serialization(format!("room {code} is missing {field}"))
            })?;
        fields.push((field, json));
    }
    RoomRecord::from_fields(fields).map(Some).map_err(encode_error)
}

fn save(storage: &Storage, code: &RoomCode, fields: &[FieldEntry]) -> Result<(), StoreError> {
    for (field, json) in fields {
        storage
            .set_item(&field_key(code, field), json)
            .map_err(js_error)?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct LocalStorageStore {
    storage: Storage,
    watchers: Rc<RefCell<Watchers>>,
}

impl LocalStorageStore {
    /// Open the window's LocalStorage and start listening for other tabs
    pub fn new() -> Result<Self, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StoreError::Unavailable("LocalStorage disabled".to_string()))?;

        let watchers = Rc::new(RefCell::new(Watchers::default()));
        let weak = Rc::downgrade(&watchers);
        let reader = storage.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: StorageEvent| {
            on_storage_event(&reader, &weak, &event);
        });
        window
            .add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())
            .map_err(js_error)?;
        closure.forget();

        Ok(Self { storage, watchers })
    }
}

/// Another tab changed one field; re-read the whole room
fn on_storage_event(storage: &Storage, watchers: &Weak<RefCell<Watchers>>, event: &StorageEvent) {
    let Some(watchers) = watchers.upgrade() else {
        return;
    };
    let Some(code) = event
        .key()
        .and_then(|key| {
            let rest = key.strip_prefix(KEY_PREFIX)?;
            let (raw, field) = rest.split_once('/')?;
            RECORD_FIELDS
                .iter()
                .any(|known| *known == field)
                .then(|| raw.to_string())
        })
        .and_then(|raw| RoomCode::parse(&raw).ok())
    else {
        return;
    };
    match load(storage, &code) {
        Ok(record) => notify(&watchers, &code, record.as_ref()),
        // The other tab is midway through writing or deleting the room
        Err(err) => log::debug!("Skipping partial room {}: {}", code, err),
    }
}

impl RoomStore for LocalStorageStore {
    fn write(&self, code: &RoomCode, record: &RoomRecord) -> Result<(), StoreError> {
        let fields = record.to_fields().map_err(encode_error)?;
        save(&self.storage, code, &fields)?;
        notify(&self.watchers, code, Some(record));
        Ok(())
    }

    fn read_once(&self, code: &RoomCode) -> Result<Option<RoomRecord>, StoreError> {
        load(&self.storage, code)
    }

    fn subscribe(
        &self,
        code: &RoomCode,
        callback: RoomCallback,
    ) -> Result<Subscription, StoreError> {
        let current = load(&self.storage, code)?;
        let id = {
            let mut watchers = self.watchers.borrow_mut();
            let id = watchers.next_id;
            watchers.next_id += 1;
            watchers.list.push(Watcher {
                id,
                code: code.clone(),
                callback: callback.clone(),
            });
            id
        };
        callback(current.as_ref());

        let weak = Rc::downgrade(&self.watchers);
        Ok(Subscription::new(move || {
            if let Some(watchers) = weak.upgrade() {
                watchers.borrow_mut().list.retain(|w| w.id != id);
            }
        }))
    }

    fn transact(
        &self,
        code: &RoomCode,
        apply: &mut dyn FnMut(&mut RoomRecord) -> bool,
    ) -> Result<Option<RoomRecord>, StoreError> {
        let Some(current) = load(&self.storage, code)? else {
            return Ok(None);
        };
        let mut draft = current.clone();
        if !apply(&mut draft) {
            return Ok(None);
        }
        let changed = draft.changed_fields(&current).map_err(encode_error)?;
        if !changed.is_empty() {
            save(&self.storage, code, &changed)?;
            notify(&self.watchers, code, Some(&draft));
        }
        Ok(Some(draft))
    }

    fn remove(&self, code: &RoomCode) -> Result<(), StoreError> {
        let presence = field_key(code, PRESENCE_FIELD);
        let existed = self.storage.get_item(&presence).map_err(js_error)?.is_some();
        self.storage.remove_item(&presence).map_err(js_error)?;
        for field in RECORD_FIELDS {
            self.storage
                .remove_item(&field_key(code, field))
                .map_err(js_error)?;
        }
        if existed {
            notify(&self.watchers, code, None);
        }
        Ok(())
    }
}
