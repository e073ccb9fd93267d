// SPDX-License-Identifier: MIT

//! Task and token identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 64-bit task identifier. `0` means "no parent" (root).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Sentinel meaning "no parent" / root of the hierarchy.
    pub const ROOT: TaskId = TaskId(0);

    pub fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(v: u64) -> Self {
        TaskId(v)
    }
}

/// 1-based identifier of a token within a [`crate::token::TokenPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u32);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token-{}", self.0)
    }
}

impl From<u32> for TokenId {
    fn from(v: u32) -> Self {
        TokenId(v)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
