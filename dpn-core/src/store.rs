// SPDX-License-Identifier: AGPL-3.0-or-later
//! Remote item store trait

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    error::DpnResult,
    item::{Item, ItemId, NewItem},
};

/// Storage quota of the authenticated account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageQuota {
    pub limit: Option<u64>,
    pub usage: Option<u64>,
    pub usage_in_trash: Option<u64>,
}

impl StorageQuota {
    pub fn available(&self) -> Option<u64> {
        Some(self.limit?.saturating_sub(self.usage.unwrap_or(0)))
    }
}

/// The authenticated user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub display_name: String,
    pub email_address: Option<String>,
    pub permission_id: Option<String>,
    pub quota: StorageQuota,
}

/// Remote item store
///
/// Implementations are handed to the navigator already authenticated. Every
/// method accepts the `root` sentinel wherever an [`ItemId`] is taken.
#[async_trait]
pub trait ItemStore: Send + Sync {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;

    /// Real identifier of the top folder the `root` sentinel stands for
    async fn root_id(&self) -> DpnResult<ItemId>;

    /// Non-trashed children of `parent`, in listing order
    async fn list_children(&self, parent: &ItemId) -> DpnResult<Vec<Item>>;

    /// Metadata for `id`; `NotFound` if it does not exist or is inaccessible
    async fn get_item(&self, id: &ItemId) -> DpnResult<Item>;

    async fn create_item(&self, item: &NewItem) -> DpnResult<Item>;
    async fn read_content(&self, id: &ItemId) -> DpnResult<Bytes>;

    /// Replace the content of `id` and commit the upload
    async fn write_content(&self, id: &ItemId, data: Bytes) -> DpnResult<Item>;

    async fn copy_item(&self, id: &ItemId, title: &str, parents: &[ItemId]) -> DpnResult<Item>;
    async fn trash(&self, id: &ItemId) -> DpnResult<()>;
    async fn restore(&self, id: &ItemId) -> DpnResult<Item>;
    async fn delete(&self, id: &ItemId) -> DpnResult<()>;
    async fn about(&self) -> DpnResult<AccountInfo>;
}
