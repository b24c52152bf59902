// SPDX-License-Identifier: AGPL-3.0-or-later
//! Drive Path Navigator
//!
//! Filesystem-like operations (ls, mkdir, cp, rm, touch, upload, download)
//! over a remote item store whose items are linked by parent ids rather than
//! paths. Every operation translates its POSIX-style path into a chain of
//! title lookups starting at the `root` sentinel.
//!
//! ```no_run
//! # async fn demo(store: std::sync::Arc<dyn dpn_core::ItemStore>) -> dpn_core::DpnResult<()> {
//! use dpn_nav::{ListOptions, Navigator};
//!
//! let nav = Navigator::new(store);
//! nav.mkdir("/backups/2024", None).await?;
//! nav.upload("notes.txt", "/backups/2024/notes.txt").await?;
//! for item in nav.ls("/backups", ListOptions::depth(1)).await? {
//!     println!("{}", item.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
mod dirs;
pub mod logging;
mod navigator;
mod resolve;
mod transfer;

pub use cache::{CacheStats, IdCache};
pub use config::NavigatorConfig;
pub use navigator::Navigator;

pub use dpn_core::{
    AccountInfo, DpnError, DpnResult, Item, ItemId, ItemKind, ListOptions, RemotePath,
    RemoveOptions,
};
