// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-account client pool.
//!
//! Each account owns at most one slot, and the slot's async mutex
//! serializes lifecycle operations for that account. There is no pool
//! wide lock; operations on different accounts never contend.

use std::sync::Arc;

use dashmap::DashMap;
use gramgate_core::{AccountId, ConnectionPhase, RawClient};
use tokio::sync::Mutex;

use crate::attempt::ConnectAttempt;

/// Mutable per-account state, guarded by the slot mutex.
///
/// Invariants held between operations: `phase == Connected` implies a
/// live client and no attempt; an awaiting phase implies both a client
/// and an attempt; `Disconnected` implies neither.
pub struct SlotState {
    pub client: Option<Box<dyn RawClient>>,
    pub attempt: Option<ConnectAttempt>,
    pub phase: ConnectionPhase,
    /// Set when the slot has been removed from the pool. A holder that
    /// acquired the Arc before removal must not complete into it.
    pub evicted: bool,
}

impl SlotState {
    fn empty() -> Self {
        Self {
            client: None,
            attempt: None,
            phase: ConnectionPhase::Disconnected,
            evicted: false,
        }
    }

    /// Drop client and attempt, returning the client for teardown.
    pub fn clear(&mut self) -> Option<Box<dyn RawClient>> {
        self.attempt = None;
        self.phase = ConnectionPhase::Disconnected;
        self.client.take()
    }

    /// Mark the slot detached and clear it. Callers must remove the
    /// slot from the pool BEFORE marking, so a late lock holder that
    /// sees the flag always finds a fresh slot on retry.
    pub fn evict(&mut self) -> Option<Box<dyn RawClient>> {
        self.evicted = true;
        self.clear()
    }
}

#[derive(Default)]
pub struct ClientPool {
    slots: DashMap<AccountId, Arc<Mutex<SlotState>>>,
}

impl ClientPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or atomically create the slot for an account. The entry API
    /// guarantees two racing callers observe the same slot.
    pub fn slot(&self, account_id: AccountId) -> Arc<Mutex<SlotState>> {
        self.slots
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(SlotState::empty())))
            .clone()
    }

    /// Peek at an existing slot without creating one. Read paths use
    /// this so disconnected accounts do not accrete empty slots.
    pub fn get(&self, account_id: AccountId) -> Option<Arc<Mutex<SlotState>>> {
        self.slots.get(&account_id).map(|entry| entry.clone())
    }

    /// Remove an account's slot. Existing holders of the Arc finish
    /// their operation on the detached state.
    pub fn remove(&self, account_id: AccountId) -> Option<Arc<Mutex<SlotState>>> {
        self.slots.remove(&account_id).map(|(_, slot)| slot)
    }

    pub fn contains(&self, account_id: AccountId) -> bool {
        self.slots.contains_key(&account_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of pooled account ids, for shutdown sweeps.
    pub fn account_ids(&self) -> Vec<AccountId> {
        self.slots.iter().map(|entry| *entry.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn racing_callers_share_one_slot() {
        let pool = Arc::new(ClientPool::new());
        let id = AccountId(7);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move { pool.slot(id) }));
        }
        let slots: Vec<_> = futures_join(handles).await;
        assert_eq!(pool.len(), 1);
        for slot in &slots[1..] {
            assert!(Arc::ptr_eq(&slots[0], slot));
        }
    }

    async fn futures_join(
        handles: Vec<tokio::task::JoinHandle<Arc<Mutex<SlotState>>>>,
    ) -> Vec<Arc<Mutex<SlotState>>> {
        let mut out = Vec::new();
        for handle in handles {
            out.push(handle.await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn remove_detaches_slot() {
        let pool = ClientPool::new();
        let id = AccountId(1);
        let slot = pool.slot(id);
        assert!(pool.contains(id));

        let removed = pool.remove(id).unwrap();
        assert!(Arc::ptr_eq(&slot, &removed));
        assert!(!pool.contains(id));
        assert!(pool.remove(id).is_none());
    }

    #[tokio::test]
    async fn evicted_slot_stays_detached() {
        let pool = ClientPool::new();
        let id = AccountId(3);
        let stale = pool.slot(id);
        pool.remove(id);
        {
            let mut state = stale.lock().await;
            state.evict();
            assert!(state.evicted);
            assert_eq!(state.phase, ConnectionPhase::Disconnected);
        }

        // A later caller gets a brand-new slot, never the detached one.
        let fresh = pool.slot(id);
        assert!(!Arc::ptr_eq(&stale, &fresh));
        assert!(!fresh.lock().await.evicted);
    }

    #[tokio::test]
    async fn clear_resets_phase() {
        let pool = ClientPool::new();
        let slot = pool.slot(AccountId(2));
        let mut state = slot.lock().await;
        state.phase = ConnectionPhase::Connected;
        assert!(state.clear().is_none());
        assert_eq!(state.phase, ConnectionPhase::Disconnected);
        assert!(state.attempt.is_none());
    }
}
