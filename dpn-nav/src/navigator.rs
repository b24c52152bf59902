// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path-addressed front end over an item store

use dpn_core::{AccountInfo, DpnResult, Item, ItemStore, RemotePath};
use std::sync::Arc;

use crate::cache::IdCache;
use crate::config::NavigatorConfig;

/// Filesystem-like operations on a remote item store, addressed by path.
///
/// Every path is resolved from the `root` sentinel one title at a time. All
/// remote calls are issued sequentially; nothing is remembered between calls
/// unless the identifier cache is switched on.
pub struct Navigator {
    pub(crate) store: Arc<dyn ItemStore>,
    pub(crate) cache: Option<IdCache>,
}

impl Navigator {
    /// Wrap an already-authenticated store
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store, cache: None }
    }

    pub fn with_config(store: Arc<dyn ItemStore>, config: &NavigatorConfig) -> Self {
        let navigator = Self::new(store);
        if config.cache_ids {
            navigator.with_id_cache()
        } else {
            navigator
        }
    }

    pub fn with_id_cache(mut self) -> Self {
        self.cache = Some(IdCache::new());
        self
    }

    pub fn store(&self) -> &dyn ItemStore {
        self.store.as_ref()
    }

    pub fn id_cache(&self) -> Option<&IdCache> {
        self.cache.as_ref()
    }

    /// The authenticated account
    pub async fn user(&self) -> DpnResult<AccountInfo> {
        self.store.about().await
    }

    /// Resolve `path` and fetch the item it names
    pub async fn resolve(&self, path: impl Into<RemotePath>) -> DpnResult<Item> {
        let id = self.path_to_id(path).await?;
        self.store.get_item(&id).await
    }
}

#[cfg(feature = "gdrive")]
impl Navigator {
    /// Open a Google Drive session and wrap it.
    ///
    /// Runs the browser flow through `open_url` when no usable tokens are on
    /// disk.
    pub async fn google_drive<F>(config: &NavigatorConfig, open_url: F) -> DpnResult<Self>
    where
        F: FnOnce(&str),
    {
        use dpn_providers::GoogleDriveStore;

        let gdrive = config
            .gdrive
            .clone()
            .ok_or_else(|| dpn_core::DpnError::Config("missing [gdrive] section".into()))?;
        let store = GoogleDriveStore::new("gdrive", gdrive);
        store.authenticate(open_url).await?;
        Ok(Self::with_config(Arc::new(store), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpn_core::AccountInfo;
    use dpn_providers::MemoryStore;

    #[tokio::test]
    async fn test_user() {
        let store = MemoryStore::new("mem").with_account(AccountInfo {
            display_name: "Ada".into(),
            email_address: Some("ada@example.com".into()),
            ..Default::default()
        });
        let nav = Navigator::new(Arc::new(store));
        let user = nav.user().await.unwrap();
        assert_eq!(user.display_name, "Ada");
        assert_eq!(user.email_address.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_with_config() {
        let store: Arc<dyn ItemStore> = Arc::new(MemoryStore::new("mem"));
        let plain = Navigator::with_config(store.clone(), &NavigatorConfig::default());
        assert!(plain.id_cache().is_none());

        let config = NavigatorConfig { cache_ids: true, ..Default::default() };
        let cached = Navigator::with_config(store, &config);
        assert!(cached.id_cache().is_some());
        assert_eq!(cached.store().id(), "mem");
    }

    #[tokio::test]
    async fn test_resolve_root() {
        let nav = Navigator::new(Arc::new(MemoryStore::new("mem")));
        let root = nav.resolve("/").await.unwrap();
        assert!(root.is_folder());
        assert_eq!(root.id, nav.store().root_id().await.unwrap());
    }
}
