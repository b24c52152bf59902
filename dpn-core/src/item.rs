// SPDX-License-Identifier: AGPL-3.0-or-later
//! Remote items

use crate::metadata::{Metadata, FOLDER_MIME_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel alias every store accepts for its top folder
pub const ROOT_ALIAS: &str = "root";

/// Opaque remote identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `root` sentinel
    pub fn root() -> Self {
        Self(ROOT_ALIAS.to_string())
    }

    pub fn is_root_alias(&self) -> bool {
        self.0 == ROOT_ALIAS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            ItemKind::Folder
        } else {
            ItemKind::File
        }
    }
}

/// A remote file or folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub kind: ItemKind,
    /// Parent ids; only the first one is followed when walking upwards
    pub parents: Vec<ItemId>,
    pub trashed: bool,
    pub metadata: Metadata,
}

impl Item {
    pub fn file(id: impl Into<ItemId>, title: impl Into<String>, parents: Vec<ItemId>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ItemKind::File,
            parents,
            trashed: false,
            metadata: Metadata::default(),
        }
    }

    pub fn folder(id: impl Into<ItemId>, title: impl Into<String>, parents: Vec<ItemId>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ItemKind::Folder,
            parents,
            trashed: false,
            metadata: Metadata::new().with_mime_type(FOLDER_MIME_TYPE),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == ItemKind::File
    }

    pub fn first_parent(&self) -> Option<&ItemId> {
        self.parents.first()
    }

    pub fn size(&self) -> Option<u64> {
        self.metadata.size
    }
}

/// Request to create an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub parents: Vec<ItemId>,
    pub kind: ItemKind,
}

impl NewItem {
    pub fn folder(title: impl Into<String>, parents: Vec<ItemId>) -> Self {
        Self { title: title.into(), parents, kind: ItemKind::Folder }
    }

    pub fn file(title: impl Into<String>, parents: Vec<ItemId>) -> Self {
        Self { title: title.into(), parents, kind: ItemKind::File }
    }

    /// Parent set with the root sentinel substituted for an empty one
    pub fn effective_parents(&self) -> Vec<ItemId> {
        if self.parents.is_empty() {
            vec![ItemId::root()]
        } else {
            self.parents.clone()
        }
    }
}
