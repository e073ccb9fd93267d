// SPDX-License-Identifier: MIT

//! Token Pool: bounded, advisory access tokens.

use crate::error::GovError;
use crate::id::{TaskId, TokenId};
use std::time::Instant;

/// Fixed capacity of every [`TokenPool`].
pub const TOKEN_POOL_CAPACITY: usize = 64;

/// Bound on [`Token::resource_name`], in bytes.
pub const RESOURCE_NAME_MAX_LEN: usize = 63;

/// Access mask bits.
pub mod access {
    pub const READ: u8 = 0b01;
    pub const WRITE: u8 = 0b10;
}

const ALLOCATED: u8 = 0b01;
const LOCKED: u8 = 0b10;

/// One arbitration token.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_id: TokenId,
    /// `TaskId::ROOT` (0) means unowned.
    pub owner_thread_id: TaskId,
    pub access_mask: u8,
    pub resource_name: String,
    pub acquisition_time: Option<Instant>,
    pub validation_bits: u8,
    pub is_transferable: bool,
}

impl Token {
    fn available(token_id: TokenId) -> Self {
        Self {
            token_id,
            owner_thread_id: TaskId::ROOT,
            access_mask: 0,
            resource_name: String::new(),
            acquisition_time: None,
            validation_bits: ALLOCATED,
            is_transferable: true,
        }
    }

    pub fn is_available(&self) -> bool {
        self.owner_thread_id.is_root() && self.validation_bits == ALLOCATED
    }

    pub fn is_owned(&self) -> bool {
        !self.owner_thread_id.is_root() && self.validation_bits == (ALLOCATED | LOCKED)
    }
}

/// Fixed-capacity pool of [`TOKEN_POOL_CAPACITY`] tokens.
///
/// Not a process singleton: constructed by the embedder and injected into a
/// [`crate::runtime::Runtime`], so tests can instantiate isolated pools.
/// Linear first-fit scan is intentional at this capacity — do not replace
/// with a free list.
pub struct TokenPool {
    slots: parking_lot::Mutex<Vec<Token>>,
}

impl TokenPool {
    pub fn new() -> Self {
        let slots = (0..TOKEN_POOL_CAPACITY as u32)
            .map(|i| Token::available(TokenId(i + 1)))
            .collect();
        Self { slots: parking_lot::Mutex::new(slots) }
    }

    /// The resulting token is transferable. Requester registration/state is
    /// validated by the caller (the Runtime, which holds the Registry lock
    /// first) — see [`Self::acquire_raw`].
    pub fn acquire(
        &self,
        requester_id: TaskId,
        resource_name: &str,
        access_mask: u8,
        now: Instant,
    ) -> Result<TokenId, GovError> {
        self.acquire_raw(requester_id, resource_name, access_mask, true, now)
    }

    /// Like [`Self::acquire`], but the resulting token is pinned
    /// (`is_transferable = false`) and cannot cross a context switch.
    pub fn acquire_pinned(
        &self,
        requester_id: TaskId,
        resource_name: &str,
        access_mask: u8,
        now: Instant,
    ) -> Result<TokenId, GovError> {
        self.acquire_raw(requester_id, resource_name, access_mask, false, now)
    }

    fn acquire_raw(
        &self,
        requester_id: TaskId,
        resource_name: &str,
        access_mask: u8,
        is_transferable: bool,
        now: Instant,
    ) -> Result<TokenId, GovError> {
        if resource_name.len() > RESOURCE_NAME_MAX_LEN {
            return Err(GovError::InvalidName);
        }
        let mut slots = self.slots.lock();
        let slot = slots
            .iter_mut()
            .find(|t| t.is_available())
            .ok_or(GovError::PoolExhausted)?;
        slot.owner_thread_id = requester_id;
        slot.access_mask = access_mask;
        slot.resource_name = resource_name.to_string();
        slot.acquisition_time = Some(now);
        slot.validation_bits = ALLOCATED | LOCKED;
        slot.is_transferable = is_transferable;
        Ok(slot.token_id)
    }

    pub fn release(&self, token_id: TokenId) -> Result<(), GovError> {
        let mut slots = self.slots.lock();
        let slot = Self::slot_mut(&mut slots, token_id)?;
        if !slot.is_owned() {
            return Err(GovError::NotOwned(token_id));
        }
        *slot = Token::available(token_id);
        Ok(())
    }

    pub fn transfer(&self, token_id: TokenId, from_id: TaskId, to_id: TaskId) -> Result<(), GovError> {
        let mut slots = self.slots.lock();
        let slot = Self::slot_mut(&mut slots, token_id)?;
        if !slot.is_owned() || slot.owner_thread_id != from_id {
            return Err(GovError::NotOwned(token_id));
        }
        if !slot.is_transferable {
            return Err(GovError::NotTransferable(token_id));
        }
        slot.owner_thread_id = to_id;
        Ok(())
    }

    /// Always succeeds, even if `task_id` owns nothing.
    pub fn reclaim_owned_by(&self, task_id: TaskId) -> usize {
        let mut slots = self.slots.lock();
        let mut count = 0;
        for slot in slots.iter_mut() {
            if slot.owner_thread_id == task_id {
                *slot = Token::available(slot.token_id);
                count += 1;
            }
        }
        count
    }

    /// Transfer every transferable token owned by `from_id` to `to_id`;
    /// leave non-transferable tokens with `from_id`. Returns the ids of the
    /// tokens moved, in slot order.
    pub fn transfer_all_transferable(&self, from_id: TaskId, to_id: TaskId) -> Vec<TokenId> {
        let mut slots = self.slots.lock();
        let mut moved = Vec::new();
        for slot in slots.iter_mut() {
            if slot.owner_thread_id == from_id && slot.is_transferable {
                slot.owner_thread_id = to_id;
                moved.push(slot.token_id);
            }
        }
        moved
    }

    pub fn snapshot(&self, token_id: TokenId) -> Result<Token, GovError> {
        let slots = self.slots.lock();
        slots
            .iter()
            .find(|t| t.token_id == token_id)
            .cloned()
            .ok_or(GovError::UnknownToken(token_id))
    }

    fn slot_mut(slots: &mut [Token], token_id: TokenId) -> Result<&mut Token, GovError> {
        let idx = token_id.0.checked_sub(1).ok_or(GovError::UnknownToken(token_id))? as usize;
        slots.get_mut(idx).ok_or(GovError::UnknownToken(token_id))
    }
}

impl Default for TokenPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
