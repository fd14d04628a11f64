//! # HS Code Storage
//!
//! Durable key-value store abstraction for the HS code verifier.
//!
//! Stores are **opaque byte stores** keyed by short names. They do not
//! interpret the JSON documents written into them; the typed layer lives in
//! `hscode_core::repository`.
//!
//! ## Design Principles
//!
//! - A store offers `get`, `put`, `delete` and prefix `list`
//! - `put` replaces a value wholesale; readers see the old or the new bytes
//! - Must be `Send + Sync`, stores are shared between the resolution path
//!   and the sync engine
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing, with fault injection
//! - [`FileStore`] - One file per key under a root directory
//!
//! ## Example
//!
//! ```rust
//! use hscode_storage::{KvStore, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! store.put("HS_METADATA", b"{}").unwrap();
//! assert_eq!(store.get("HS_METADATA").unwrap().as_deref(), Some(&b"{}"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod keys;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use keys::{
    BACKUP_TABLE_KEY, CONTROLLED_LIST_KEY, CURRENT_TABLE_KEY, METADATA_KEY, SANCTIONED_LIST_KEY,
};
pub use memory::InMemoryStore;
pub use store::KvStore;
