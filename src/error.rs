// SPDX-License-Identifier: MIT

//! Error kinds returned by every fallible operation in this crate.
//!
//! One enum per crate: a single `thiserror`-derived error type per
//! component boundary, rather than a per-module error per collaborator.

use crate::id::{TaskId, TokenId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovError {
    /// Token pool has no free slot.
    #[error("token pool exhausted")]
    PoolExhausted,

    /// Token id out of range.
    #[error("unknown token {0}")]
    UnknownToken(TokenId),

    /// Token operation on a token that is not currently owned.
    #[error("token {0} is not owned")]
    NotOwned(TokenId),

    /// Token is pinned to its owner and cannot be transferred.
    #[error("token {0} is not transferable")]
    NotTransferable(TokenId),

    /// Resource name exceeds the 63-byte bound.
    #[error("resource name exceeds 63 bytes")]
    InvalidName,

    /// Task id not present in the registry.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    /// `acquire`'s requester is not registered (or not Running/New).
    #[error("requester {0} is not a registered, runnable task")]
    UnknownRequester(TaskId),

    /// Generation depth would exceed `MAX_HIERARCHY_DEPTH`.
    #[error("generation depth would exceed {0}")]
    HierarchyDepthExceeded(u8),

    /// Parent already has `MAX_CHILDREN_PER_PROCESS` children.
    #[error("parent {0} already has {1} children")]
    ChildLimitExceeded(TaskId, u32),

    /// Registry is at `MAX_TASKS` capacity.
    #[error("registry is full")]
    RegistryFull,

    /// `context_switch` denied because the two tasks are not in the same hierarchy.
    #[error("context switch denied: not same hierarchy")]
    NotSameHierarchy,

    /// `context_switch` denied because a participant has already reached `Terminated`.
    #[error("context switch denied: task {0} already terminated")]
    TaskTerminated(TaskId),

    /// `Runtime::start` called on an already-running runtime.
    #[error("runtime already initialized")]
    AlreadyInitialized,

    /// Operation attempted on a runtime that has not been started, or has shut down.
    #[error("runtime not initialized")]
    NotInitialized,
}
