// SPDX-License-Identifier: AGPL-3.0-or-later
//! Directory operations: mkdir, ls, rm, restore, cp, touch

use dpn_core::{
    DpnError, DpnResult, Item, ItemId, ListOptions, NewItem, RemotePath, RemoveOptions,
};
use std::collections::VecDeque;

use crate::navigator::Navigator;

impl Navigator {
    /// Create every missing folder along `path`.
    ///
    /// Segments are created under `parent_id` (the root when `None`). Existing
    /// folders are reused, so calling this twice creates nothing new. Returns
    /// the folder chain in path order.
    pub async fn mkdir(
        &self,
        path: impl Into<RemotePath>,
        parent_id: Option<&ItemId>,
    ) -> DpnResult<Vec<Item>> {
        let path = path.into();
        let mut parents = vec![parent_id.cloned().unwrap_or_else(ItemId::root)];
        tracing::info!("creating path `{}` with parents {:?}", path, parents);

        let mut chain = Vec::with_capacity(path.depth());
        for title in &path.segments {
            let folder = self.mkdir_one(title, &parents).await?;
            parents = vec![folder.id.clone()];
            chain.push(folder);
        }
        Ok(chain)
    }

    async fn mkdir_one(&self, title: &str, parents: &[ItemId]) -> DpnResult<Item> {
        for parent in parents {
            tracing::debug!("checking if `{}` exists in {}", title, parent);
            let existing = self
                .store
                .list_children(parent)
                .await?
                .into_iter()
                .find(|child| child.title == title);
            if let Some(item) = existing {
                tracing::debug!("directory `{}` already exists", title);
                return Ok(item);
            }
        }

        tracing::debug!("creating directory `{}` under {:?}", title, parents);
        let folder = self
            .store
            .create_item(&NewItem::folder(title, parents.to_vec()))
            .await?;
        if let Some(cache) = &self.cache {
            for parent in parents {
                cache.insert(parent, title, &folder.id);
            }
        }
        Ok(folder)
    }

    /// List the folder at `path`; see [`Navigator::ls_folder`]
    pub async fn ls(&self, path: impl Into<RemotePath>, options: ListOptions) -> DpnResult<Vec<Item>> {
        let folder_id = self.path_to_id(path).await?;
        self.ls_folder(&folder_id, options).await
    }

    /// List the non-trashed children of `folder_id`.
    ///
    /// With `maxdepth > 0` child folders are descended into breadth-first, one
    /// level per unit of depth. Results come back in breadth-first order.
    pub async fn ls_folder(&self, folder_id: &ItemId, options: ListOptions) -> DpnResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut pending = VecDeque::from([(folder_id.clone(), 0usize)]);

        while let Some((id, depth)) = pending.pop_front() {
            let children = self.store.list_children(&id).await?;
            for child in children {
                if child.is_folder() && depth < options.maxdepth {
                    tracing::debug!("list {}", child.title);
                    pending.push_back((child.id.clone(), depth + 1));
                }
                items.push(child);
            }
        }
        Ok(items)
    }

    /// Trash the item at `path`, or delete it for good with `permanently`
    pub async fn rm(&self, path: impl Into<RemotePath>, options: RemoveOptions) -> DpnResult<()> {
        let path = path.into();
        let id = self.path_to_id(&path).await?;
        if id.is_root_alias() {
            return Err(DpnError::Unsupported("cannot remove the root folder".into()));
        }

        if options.permanently {
            tracing::info!("deleting {} permanently", path);
            self.store.delete(&id).await?;
        } else {
            tracing::info!("moving {} to trash", path);
            self.store.trash(&id).await?;
        }

        if let Some(cache) = &self.cache {
            cache.invalidate_id(&id);
        }
        Ok(())
    }

    /// Take a trashed item back out of the trash
    pub async fn restore(&self, id: &ItemId) -> DpnResult<Item> {
        let item = self.store.restore(id).await?;
        tracing::info!("restored `{}` ({})", item.title, item.id);
        // It may now shadow a same-titled sibling created meanwhile
        if let Some(cache) = &self.cache {
            cache.invalidate_title(&item.title);
        }
        Ok(item)
    }

    /// Copy a single file.
    ///
    /// An existing folder at `dst` receives the copy under the source title;
    /// otherwise the copy is made in `dst`'s parent folder under `dst`'s
    /// basename. Folders cannot be copied.
    pub async fn cp(&self, src: impl Into<RemotePath>, dst: impl Into<RemotePath>) -> DpnResult<Item> {
        let src = src.into();
        let dst = dst.into();

        let source = self.resolve(&src).await?;
        if source.is_folder() {
            return Err(DpnError::Unsupported(format!("cannot copy folder {}", src)));
        }

        let (parent_id, title) = match self.resolve(&dst).await {
            Ok(target) if target.is_folder() => (target.id, source.title.clone()),
            Ok(_) => self.copy_target(&dst).await?,
            Err(e) if e.is_not_found() => self.copy_target(&dst).await?,
            Err(e) => return Err(e),
        };

        tracing::info!("copying {} to `{}` in {}", src, title, parent_id);
        let copy = self
            .store
            .copy_item(&source.id, &title, std::slice::from_ref(&parent_id))
            .await?;
        // The parent may be keyed by its real id or by the root alias
        if let Some(cache) = &self.cache {
            cache.invalidate_title(&title);
        }
        Ok(copy)
    }

    async fn copy_target(&self, dst: &RemotePath) -> DpnResult<(ItemId, String)> {
        let (parent, name) = match (dst.parent(), dst.name()) {
            (Some(parent), Some(name)) => (parent, name.to_string()),
            _ => return Err(DpnError::InvalidPath(dst.to_string())),
        };
        let parent_id = self.path_to_id(&parent).await?;
        Ok((parent_id, name))
    }

    /// Return the item at `path`, creating an empty file there if needed.
    ///
    /// An existing item is returned untouched. Fails with not-found when the
    /// parent folder does not exist.
    pub async fn touch(&self, path: impl Into<RemotePath>) -> DpnResult<Item> {
        let path = path.into();
        match self.resolve(&path).await {
            Ok(item) => return Ok(item),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let (dir, name) = match (path.parent(), path.name()) {
            (Some(dir), Some(name)) => (dir, name),
            _ => return Err(DpnError::InvalidPath(path.to_string())),
        };

        let dir_id = match self.path_to_id(&dir).await {
            Ok(id) => id,
            Err(e) => {
                if e.is_not_found() {
                    tracing::error!("remote path `{}` doesn't exist", dir);
                }
                return Err(e);
            }
        };

        let file = self
            .store
            .create_item(&NewItem::file(name, vec![dir_id.clone()]))
            .await?;
        tracing::debug!("created empty file {}", path);
        if let Some(cache) = &self.cache {
            cache.insert(&dir_id, name, &file.id);
        }
        Ok(file)
    }
}
