// SPDX-License-Identifier: MIT

use super::*;
use std::time::Instant;

fn t(id: u64) -> TaskId {
    TaskId(id)
}

#[test]
fn acquire_first_fit_in_index_order() {
    let pool = TokenPool::new();
    let a = pool.acquire(t(1), "res-a", access::READ, Instant::now()).unwrap();
    let b = pool.acquire(t(1), "res-b", access::READ, Instant::now()).unwrap();
    assert_eq!(a, TokenId(1));
    assert_eq!(b, TokenId(2));
}

#[test]
fn acquire_release_restores_available_state() {
    let pool = TokenPool::new();
    let before = pool.snapshot(TokenId(1)).unwrap();
    let tok = pool.acquire(t(5), "res", access::READ | access::WRITE, Instant::now()).unwrap();
    pool.release(tok).unwrap();
    let after = pool.snapshot(tok).unwrap();
    assert!(after.is_available());
    assert_eq!(before.owner_thread_id, after.owner_thread_id);
    assert_eq!(before.access_mask, after.access_mask);
    assert_eq!(before.validation_bits, after.validation_bits);
    assert_eq!(before.resource_name, after.resource_name);
}

#[test]
fn release_unknown_token_errors() {
    let pool = TokenPool::new();
    let err = pool.release(TokenId(999)).unwrap_err();
    assert_eq!(err, GovError::UnknownToken(TokenId(999)));
}

#[test]
fn release_not_owned_errors() {
    let pool = TokenPool::new();
    let err = pool.release(TokenId(1)).unwrap_err();
    assert_eq!(err, GovError::NotOwned(TokenId(1)));
}

#[test]
fn invalid_name_rejected() {
    let pool = TokenPool::new();
    let long_name = "x".repeat(RESOURCE_NAME_MAX_LEN + 1);
    let err = pool.acquire(t(1), &long_name, access::READ, Instant::now()).unwrap_err();
    assert_eq!(err, GovError::InvalidName);
}

#[test]
fn pool_exhaustion_then_release_reuses_slot() {
    let pool = TokenPool::new();
    let mut ids = Vec::new();
    for i in 0..TOKEN_POOL_CAPACITY {
        ids.push(pool.acquire(t(i as u64 + 1), "res", access::READ, Instant::now()).unwrap());
    }
    let err = pool.acquire(t(1000), "overflow", access::READ, Instant::now()).unwrap_err();
    assert_eq!(err, GovError::PoolExhausted);

    pool.release(ids[10]).unwrap();
    let reused = pool.acquire(t(2000), "res2", access::READ, Instant::now()).unwrap();
    assert_eq!(reused, ids[10]);
}

#[test]
fn transfer_moves_ownership() {
    let pool = TokenPool::new();
    let tok = pool.acquire(t(1), "res", access::READ, Instant::now()).unwrap();
    pool.transfer(tok, t(1), t(2)).unwrap();
    let snap = pool.snapshot(tok).unwrap();
    assert_eq!(snap.owner_thread_id, t(2));
}

#[test]
fn transfer_requires_current_owner() {
    let pool = TokenPool::new();
    let tok = pool.acquire(t(1), "res", access::READ, Instant::now()).unwrap();
    let err = pool.transfer(tok, t(99), t(2)).unwrap_err();
    assert_eq!(err, GovError::NotOwned(tok));
}

#[test]
fn transfer_of_pinned_token_denied() {
    let pool = TokenPool::new();
    let tok = pool.acquire_pinned(t(1), "res", access::READ, Instant::now()).unwrap();
    let err = pool.transfer(tok, t(1), t(2)).unwrap_err();
    assert_eq!(err, GovError::NotTransferable(tok));
}

#[test]
fn reclaim_owned_by_releases_all_and_is_idempotent() {
    let pool = TokenPool::new();
    pool.acquire(t(1), "res-a", access::READ, Instant::now()).unwrap();
    pool.acquire(t(1), "res-b", access::WRITE, Instant::now()).unwrap();
    pool.acquire(t(2), "res-c", access::READ, Instant::now()).unwrap();

    assert_eq!(pool.reclaim_owned_by(t(1)), 2);
    assert_eq!(pool.reclaim_owned_by(t(1)), 0);
    let snap = pool.snapshot(TokenId(3)).unwrap();
    assert!(snap.is_owned());
}

#[test]
fn transfer_all_transferable_leaves_pinned_tokens_behind() {
    let pool = TokenPool::new();
    let movable = pool.acquire(t(1), "res-a", access::READ, Instant::now()).unwrap();
    let pinned = pool.acquire_pinned(t(1), "res-b", access::READ, Instant::now()).unwrap();

    let moved = pool.transfer_all_transferable(t(1), t(2));
    assert_eq!(moved, vec![movable]);
    assert_eq!(pool.snapshot(movable).unwrap().owner_thread_id, t(2));
    assert_eq!(pool.snapshot(pinned).unwrap().owner_thread_id, t(1));
}
