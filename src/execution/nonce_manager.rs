use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy_primitives::Address;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::execution::{client::ChainClient, errors::ExecutionError};

type NonceSlot = Arc<AsyncMutex<Option<u64>>>;
type NonceSlots = Arc<Mutex<HashMap<Address, NonceSlot>>>;

/// Serializes nonce assignment per account.
///
/// Each account has one gate. A [`NonceLease`] holds the gate from nonce selection until the
/// transaction was submitted, so concurrent swaps of one account get distinct nonces in
/// submission order.
///
/// A gate only outlives its last lease while it caches a committed nonce. Gates that fall back
/// to the node's count are dropped once nobody holds or waits on them.
#[derive(Default)]
pub struct NonceManager {
    accounts: NonceSlots,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, account: Address) -> NonceSlot {
        let mut accounts = self
            .accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        accounts
            .entry(account)
            .or_default()
            .clone()
    }

    /// Waits for the account's gate and picks the next nonce: the larger of the locally
    /// committed one and the node's pending transaction count.
    pub async fn reserve<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        account: Address,
    ) -> Result<NonceLease, ExecutionError> {
        let guard = self.slot(account).lock_owned().await;
        let on_chain = client.transaction_count(account).await?;
        let nonce = match *guard {
            Some(cached) => cached.max(on_chain),
            None => on_chain,
        };
        debug!(%account, nonce, on_chain, "Reserved nonce");
        Ok(NonceLease { guard, accounts: self.accounts.clone(), account, nonce })
    }

    /// Forgets the committed nonce of `account`. The next lease starts from the node's count.
    ///
    /// Used once a committed transaction is known to be stuck, since it may have left the
    /// mempool and freed its nonce.
    pub async fn reset(&self, account: Address) {
        let slot = self.slot(account);
        *slot.lock().await = None;
        drop(slot);
        debug!(%account, "Reset nonce");
        prune(&self.accounts, account);
    }
}

/// Drops the gate of `account` when only the map still refers to it.
fn prune(accounts: &NonceSlots, account: Address) {
    let mut accounts = accounts
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let idle = accounts
        .get(&account)
        .is_some_and(|slot| Arc::strong_count(slot) == 1);
    if idle {
        accounts.remove(&account);
    }
}

/// Exclusive right to submit with `nonce` for one account.
///
/// Dropping the lease without `commit` or `release` leaves the gate's state untouched.
pub struct NonceLease {
    guard: OwnedMutexGuard<Option<u64>>,
    accounts: NonceSlots,
    account: Address,
    nonce: u64,
}

impl NonceLease {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The transaction was accepted. The next lease starts after this nonce.
    pub fn commit(mut self) {
        *self.guard = Some(self.nonce + 1);
    }

    /// The submission failed or its outcome is unknown. The next lease resyncs from the node.
    pub fn release(self) {
        let NonceLease { mut guard, accounts, account, nonce } = self;
        *guard = None;
        drop(guard);
        debug!(%account, nonce, "Released nonce");
        prune(&accounts, account);
    }
}
