// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory item store
//!
//! Keeps a parent-linked item graph in process memory and behaves like the
//! remote store: listings skip trashed items, parents are reported by their
//! real ids, and the `root` sentinel aliases the top folder.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dpn_core::{
    AccountInfo, DpnError, DpnResult, Item, ItemId, ItemKind, ItemStore, Metadata, NewItem,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

const DEFAULT_ROOT_ID: &str = "0AMemoryRoot";

struct Node {
    item: Item,
    content: Bytes,
}

#[derive(Default)]
struct State {
    nodes: HashMap<ItemId, Node>,
    /// Creation order, which is also listing order
    order: Vec<ItemId>,
    next_id: u64,
}

/// In-memory item store
pub struct MemoryStore {
    id: String,
    root: ItemId,
    account: AccountInfo,
    state: RwLock<State>,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_root_id(id, DEFAULT_ROOT_ID)
    }

    pub fn with_root_id(id: impl Into<String>, root_id: impl Into<ItemId>) -> Self {
        let root: ItemId = root_id.into();
        let root_item = Item::folder(root.clone(), "My Drive", Vec::new());

        let mut state = State::default();
        state.order.push(root.clone());
        state.nodes.insert(root.clone(), Node { item: root_item, content: Bytes::new() });

        Self {
            id: id.into(),
            root,
            account: AccountInfo {
                display_name: "Memory User".into(),
                ..Default::default()
            },
            state: RwLock::new(state),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_account(mut self, account: AccountInfo) -> Self {
        self.account = account;
        self
    }

    /// Number of `list_children` calls served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Insert an item as-is, bypassing parent validation.
    ///
    /// Lets callers build graphs the remote store could hand back but never
    /// lets you create directly, such as orphans or parent cycles.
    pub async fn insert_raw(&self, item: Item) {
        let mut state = self.state.write().await;
        if !state.nodes.contains_key(&item.id) {
            state.order.push(item.id.clone());
        }
        state.nodes.insert(item.id.clone(), Node { item, content: Bytes::new() });
    }

    /// Whether `id` is still stored, trashed or not
    pub async fn contains(&self, id: &ItemId) -> bool {
        let id = self.canonical(id);
        self.state.read().await.nodes.contains_key(&id)
    }

    fn canonical(&self, id: &ItemId) -> ItemId {
        if id.is_root_alias() {
            self.root.clone()
        } else {
            id.clone()
        }
    }

    fn not_found(id: &ItemId) -> DpnError {
        DpnError::NotFound(format!("item {}", id))
    }

    fn allocate_id(state: &mut State) -> ItemId {
        state.next_id += 1;
        ItemId::new(format!("mem-{:06}", state.next_id))
    }

    fn canonical_parents(&self, state: &State, parents: &[ItemId]) -> DpnResult<Vec<ItemId>> {
        let mut resolved = Vec::with_capacity(parents.len());
        for parent in parents {
            let parent = self.canonical(parent);
            let node = state.nodes.get(&parent).ok_or_else(|| Self::not_found(&parent))?;
            if !node.item.is_folder() {
                return Err(DpnError::NotAFolder(parent.to_string()));
            }
            resolved.push(parent);
        }
        Ok(resolved)
    }

    fn insert_node(state: &mut State, item: Item, content: Bytes) -> Item {
        state.order.push(item.id.clone());
        state.nodes.insert(item.id.clone(), Node { item: item.clone(), content });
        item
    }
}

fn content_metadata(base: &Metadata, content: &Bytes) -> Metadata {
    let mut metadata = base.clone();
    metadata.size = Some(content.len() as u64);
    metadata.content_hash = Some(blake3::hash(content).to_hex().to_string());
    metadata.modified = Some(Utc::now());
    metadata
}

#[async_trait]
impl ItemStore for MemoryStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "In-Memory Store"
    }

    async fn root_id(&self) -> DpnResult<ItemId> {
        Ok(self.root.clone())
    }

    async fn list_children(&self, parent: &ItemId) -> DpnResult<Vec<Item>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        let parent = self.canonical(parent);
        let state = self.state.read().await;

        Ok(state
            .order
            .iter()
            .filter_map(|id| state.nodes.get(id))
            .filter(|node| !node.item.trashed && node.item.parents.contains(&parent))
            .map(|node| node.item.clone())
            .collect())
    }

    async fn get_item(&self, id: &ItemId) -> DpnResult<Item> {
        let id = self.canonical(id);
        let state = self.state.read().await;
        state
            .nodes
            .get(&id)
            .map(|node| node.item.clone())
            .ok_or_else(|| Self::not_found(&id))
    }

    async fn create_item(&self, new: &NewItem) -> DpnResult<Item> {
        let mut state = self.state.write().await;
        let parents = self.canonical_parents(&state, &new.effective_parents())?;
        let id = Self::allocate_id(&mut state);

        let mut item = match new.kind {
            ItemKind::Folder => Item::folder(id, new.title.clone(), parents),
            ItemKind::File => Item::file(id, new.title.clone(), parents),
        };
        let now = Utc::now();
        item.metadata.created = Some(now);
        item.metadata.modified = Some(now);
        if item.is_file() {
            item.metadata = content_metadata(&item.metadata, &Bytes::new());
        }

        Ok(Self::insert_node(&mut state, item, Bytes::new()))
    }

    async fn read_content(&self, id: &ItemId) -> DpnResult<Bytes> {
        let id = self.canonical(id);
        let state = self.state.read().await;
        let node = state.nodes.get(&id).ok_or_else(|| Self::not_found(&id))?;
        if node.item.is_folder() {
            return Err(DpnError::Unsupported(format!("folder {} has no content", id)));
        }
        Ok(node.content.clone())
    }

    async fn write_content(&self, id: &ItemId, data: Bytes) -> DpnResult<Item> {
        let id = self.canonical(id);
        let mut state = self.state.write().await;
        let node = state.nodes.get_mut(&id).ok_or_else(|| Self::not_found(&id))?;
        if node.item.is_folder() {
            return Err(DpnError::Unsupported(format!("folder {} has no content", id)));
        }
        node.item.metadata = content_metadata(&node.item.metadata, &data);
        node.content = data;
        Ok(node.item.clone())
    }

    async fn copy_item(&self, id: &ItemId, title: &str, parents: &[ItemId]) -> DpnResult<Item> {
        let id = self.canonical(id);
        let mut state = self.state.write().await;

        let (source, content) = {
            let node = state.nodes.get(&id).ok_or_else(|| Self::not_found(&id))?;
            (node.item.clone(), node.content.clone())
        };
        if source.is_folder() {
            return Err(DpnError::Unsupported(format!("cannot copy folder {}", id)));
        }

        let parents = if parents.is_empty() {
            source.parents.clone()
        } else {
            self.canonical_parents(&state, parents)?
        };
        let new_id = Self::allocate_id(&mut state);

        let mut item = Item::file(new_id, title, parents);
        item.metadata = content_metadata(&source.metadata, &content);
        item.metadata.created = Some(Utc::now());

        Ok(Self::insert_node(&mut state, item, content))
    }

    async fn trash(&self, id: &ItemId) -> DpnResult<()> {
        let id = self.canonical(id);
        if id == self.root {
            return Err(DpnError::Unsupported("cannot trash the root folder".into()));
        }
        let mut state = self.state.write().await;
        let node = state.nodes.get_mut(&id).ok_or_else(|| Self::not_found(&id))?;
        node.item.trashed = true;
        Ok(())
    }

    async fn restore(&self, id: &ItemId) -> DpnResult<Item> {
        let id = self.canonical(id);
        let mut state = self.state.write().await;
        let node = state.nodes.get_mut(&id).ok_or_else(|| Self::not_found(&id))?;
        node.item.trashed = false;
        Ok(node.item.clone())
    }

    async fn delete(&self, id: &ItemId) -> DpnResult<()> {
        let id = self.canonical(id);
        if id == self.root {
            return Err(DpnError::Unsupported("cannot delete the root folder".into()));
        }
        let mut state = self.state.write().await;
        if !state.nodes.contains_key(&id) {
            return Err(Self::not_found(&id));
        }

        // Descendants whose every parent is going away go with it
        let mut doomed: HashSet<ItemId> = HashSet::from([id]);
        loop {
            let more: Vec<ItemId> = state
                .nodes
                .values()
                .filter(|node| !doomed.contains(&node.item.id))
                .filter(|node| {
                    !node.item.parents.is_empty()
                        && node.item.parents.iter().all(|p| doomed.contains(p))
                })
                .map(|node| node.item.id.clone())
                .collect();
            if more.is_empty() {
                break;
            }
            doomed.extend(more);
        }

        state.nodes.retain(|id, _| !doomed.contains(id));
        state.order.retain(|id| !doomed.contains(id));
        Ok(())
    }

    async fn about(&self) -> DpnResult<AccountInfo> {
        Ok(self.account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_alias_resolves() {
        let store = MemoryStore::new("mem");
        let root = store.get_item(&ItemId::root()).await.unwrap();
        assert_eq!(root.id, ItemId::new(DEFAULT_ROOT_ID));
        assert!(root.is_folder());
        assert_eq!(store.root_id().await.unwrap(), root.id);
    }

    #[tokio::test]
    async fn test_create_and_list_in_order() {
        let store = MemoryStore::new("mem");
        let a = store.create_item(&NewItem::folder("a", vec![])).await.unwrap();
        let b = store.create_item(&NewItem::file("b.txt", vec![ItemId::root()])).await.unwrap();

        assert_eq!(a.parents, vec![ItemId::new(DEFAULT_ROOT_ID)]);
        let titles: Vec<_> = store
            .list_children(&ItemId::root())
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["a", "b.txt"]);
        assert_eq!(b.size(), Some(0));
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_under_missing_or_file_parent() {
        let store = MemoryStore::new("mem");
        let err = store
            .create_item(&NewItem::file("x", vec![ItemId::new("nope")]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let file = store.create_item(&NewItem::file("f", vec![])).await.unwrap();
        let err = store.create_item(&NewItem::file("x", vec![file.id])).await.unwrap_err();
        assert!(matches!(err, DpnError::NotAFolder(_)));
    }

    #[tokio::test]
    async fn test_content_round_trip() {
        let store = MemoryStore::new("mem");
        let file = store.create_item(&NewItem::file("f", vec![])).await.unwrap();
        let updated = store
            .write_content(&file.id, Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_eq!(updated.size(), Some(5));
        assert!(updated.metadata.content_hash.is_some());
        assert_eq!(store.read_content(&file.id).await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_trash_hides_and_restore_shows() {
        let store = MemoryStore::new("mem");
        let file = store.create_item(&NewItem::file("f", vec![])).await.unwrap();

        store.trash(&file.id).await.unwrap();
        assert!(store.list_children(&ItemId::root()).await.unwrap().is_empty());
        assert!(store.get_item(&file.id).await.unwrap().trashed);

        store.restore(&file.id).await.unwrap();
        assert_eq!(store.list_children(&ItemId::root()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_takes_descendants() {
        let store = MemoryStore::new("mem");
        let dir = store.create_item(&NewItem::folder("d", vec![])).await.unwrap();
        let child = store
            .create_item(&NewItem::file("c", vec![dir.id.clone()]))
            .await
            .unwrap();
        let shared = store
            .create_item(&NewItem::file("s", vec![dir.id.clone(), ItemId::root()]))
            .await
            .unwrap();

        store.delete(&dir.id).await.unwrap();
        assert!(!store.contains(&dir.id).await);
        assert!(!store.contains(&child.id).await);
        assert!(store.contains(&shared.id).await);
        assert!(store.delete(&dir.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_root_cannot_be_removed() {
        let store = MemoryStore::new("mem");
        assert!(matches!(store.trash(&ItemId::root()).await, Err(DpnError::Unsupported(_))));
        assert!(matches!(store.delete(&ItemId::root()).await, Err(DpnError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_copy_rejects_folders() {
        let store = MemoryStore::new("mem");
        let dir = store.create_item(&NewItem::folder("d", vec![])).await.unwrap();
        let err = store.copy_item(&dir.id, "d2", &[]).await.unwrap_err();
        assert!(matches!(err, DpnError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_copy_keeps_content() {
        let store = MemoryStore::new("mem");
        let file = store.create_item(&NewItem::file("f", vec![])).await.unwrap();
        store.write_content(&file.id, Bytes::from_static(b"data")).await.unwrap();

        let copy = store.copy_item(&file.id, "g", &[]).await.unwrap();
        assert_ne!(copy.id, file.id);
        assert_eq!(copy.title, "g");
        assert_eq!(copy.parents, file.parents);
        assert_eq!(store.read_content(&copy.id).await.unwrap(), Bytes::from_static(b"data"));
    }
}
