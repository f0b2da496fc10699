//! Networked play
//!
//! Rooms live in a shared key-value store behind [`RoomStore`]. The
//! [`netplay`] module layers the host/guest protocol on top of it.

pub mod memory;
pub mod netplay;
pub mod room;
pub mod store;
#[cfg(target_arch = "wasm32")]
pub mod web_store;

pub use memory::MemoryStore;
pub use netplay::{
    GuestLink, HostLink, JoinError, Mailbox, RemoteView, Role, RoomStatus, create_room, join_room,
};
pub use room::{RoomCode, RoomCodeError, RoomPatch, RoomRecord, ScoreField};
pub use store::{RoomCallback, RoomStore, StoreError, Subscription};
#[cfg(target_arch = "wasm32")]
pub use web_store::LocalStorageStore;
