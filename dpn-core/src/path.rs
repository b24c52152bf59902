// SPDX-License-Identifier: AGPL-3.0-or-later
//! Remote path abstraction
//!
//! Paths are POSIX-style and rooted at the `root` sentinel. A leading `root`
//! segment is optional: `docs/a.txt`, `/docs/a.txt`, `root/docs/a.txt` and
//! `/root/docs/a.txt` all name the same item.

use crate::item::ROOT_ALIAS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path to a remote item, as a list of titles below the root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RemotePath {
    pub segments: Vec<String>,
}

impl RemotePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        let trimmed = path.trim_start_matches('/');
        let rest = if trimmed == ROOT_ALIAS {
            ""
        } else {
            trimmed
                .strip_prefix(ROOT_ALIAS)
                .and_then(|r| r.strip_prefix('/'))
                .unwrap_or(trimmed)
        };
        let segments = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { segments }
    }

    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn join(&self, name: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        for part in name.as_ref().split('/').filter(|s| !s.is_empty()) {
            if part == ".." {
                segments.pop();
            } else if part != "." {
                segments.push(part.to_string());
            }
        }
        Self { segments }
    }

    /// Directory part of the path; `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut segments = self.segments.clone();
            segments.pop();
            Some(Self { segments })
        }
    }

    /// Last segment (basename); `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn to_path_string(&self) -> String {
        if self.segments.is_empty() {
            format!("/{}", ROOT_ALIAS)
        } else {
            format!("/{}/{}", ROOT_ALIAS, self.segments.join("/"))
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}

impl FromStr for RemotePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for RemotePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for RemotePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&String> for RemotePath {
    fn from(path: &String) -> Self {
        Self::new(path)
    }
}

impl From<&RemotePath> for RemotePath {
    fn from(path: &RemotePath) -> Self {
        path.clone()
    }
}
