// SPDX-License-Identifier: AGPL-3.0-or-later
//! Operation options

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Number of folder levels below the listed one to descend into
    pub maxdepth: usize,
}

impl ListOptions {
    pub fn depth(maxdepth: usize) -> Self {
        Self { maxdepth }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOptions {
    /// Delete irrecoverably instead of moving to the trash
    pub permanently: bool,
}

impl RemoveOptions {
    pub fn trash() -> Self {
        Self { permanently: false }
    }

    pub fn permanent() -> Self {
        Self { permanently: true }
    }
}
