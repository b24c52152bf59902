// SPDX-License-Identifier: AGPL-3.0-or-later
//! Drive Path Navigator Core
//!
//! Core traits and types shared by the item stores and the path navigator.

pub mod error;
pub mod item;
pub mod metadata;
pub mod operations;
pub mod path;
pub mod store;

pub use error::{DpnError, DpnResult};
pub use item::{Item, ItemId, ItemKind, NewItem, ROOT_ALIAS};
pub use metadata::{Metadata, FOLDER_MIME_TYPE};
pub use operations::{ListOptions, RemoveOptions};
pub use path::RemotePath;
pub use store::{AccountInfo, ItemStore, StorageQuota};
