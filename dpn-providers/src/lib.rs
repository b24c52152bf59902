// SPDX-License-Identifier: AGPL-3.0-or-later
//! Item store providers for Drive Path Navigator
//!
//! - `memory`: in-process item graph, the offline stand-in for a remote store
//! - `gdrive`: Google Drive API v3 with OAuth 2.0 + PKCE

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "gdrive")]
pub mod gdrive;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

#[cfg(feature = "gdrive")]
pub use gdrive::{GoogleAuth, GoogleDriveConfig, GoogleDriveStore, GoogleTokens};
