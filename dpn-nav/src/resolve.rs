// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path ↔ identifier resolution

use dpn_core::{DpnError, DpnResult, ItemId, RemotePath};
use std::collections::HashSet;

use crate::navigator::Navigator;

impl Navigator {
    /// Id of the first non-trashed child of `parent_id` titled `title`.
    ///
    /// Titles are matched exactly; with duplicates the first one in listing
    /// order wins.
    pub async fn title_to_id(&self, title: &str, parent_id: &ItemId) -> DpnResult<ItemId> {
        if let Some(id) = self.cache.as_ref().and_then(|c| c.get(parent_id, title)) {
            tracing::trace!("cache hit for `{}` in {}", title, parent_id);
            return Ok(id);
        }

        let id = self
            .store
            .list_children(parent_id)
            .await?
            .into_iter()
            .find(|child| child.title == title)
            .map(|child| child.id)
            .ok_or_else(|| DpnError::NotFound(format!("`{}` in {}", title, parent_id)))?;

        if let Some(cache) = &self.cache {
            cache.insert(parent_id, title, &id);
        }
        Ok(id)
    }

    pub async fn id_to_title(&self, id: &ItemId) -> DpnResult<String> {
        Ok(self.store.get_item(id).await?.title)
    }

    /// Resolve `path` one segment at a time starting from `root`
    pub async fn path_to_id(&self, path: impl Into<RemotePath>) -> DpnResult<ItemId> {
        let path = path.into();
        let mut id = ItemId::root();

        for segment in &path.segments {
            id = match self.title_to_id(segment, &id).await {
                Ok(child) => child,
                Err(e) if e.is_not_found() => {
                    tracing::debug!("`{}` not found while resolving {}", segment, path);
                    return Err(DpnError::NotFound(path.to_string()));
                }
                Err(e) => return Err(e),
            };
        }

        tracing::debug!("resolved {} to {}", path, id);
        Ok(id)
    }

    /// Walk first parents upwards from `id` to the store's root
    pub async fn id_to_path(&self, id: &ItemId) -> DpnResult<RemotePath> {
        let root = self.store.root_id().await?;
        if id.is_root_alias() || *id == root {
            return Ok(RemotePath::root());
        }

        let mut item = self.store.get_item(id).await?;
        let mut titles = vec![item.title.clone()];
        let mut seen = HashSet::from([item.id.clone()]);

        loop {
            let parent = item
                .first_parent()
                .cloned()
                .ok_or_else(|| DpnError::Detached(id.to_string()))?;
            if parent == root || parent.is_root_alias() {
                break;
            }
            if !seen.insert(parent.clone()) {
                return Err(DpnError::CycleDetected(parent.to_string()));
            }
            item = self.store.get_item(&parent).await?;
            titles.push(item.title.clone());
        }

        titles.reverse();
        Ok(RemotePath::from_segments(titles))
    }

    /// Whether `path` resolves; errors other than not-found propagate
    pub async fn exists(&self, path: impl Into<RemotePath>) -> DpnResult<bool> {
        match self.path_to_id(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
