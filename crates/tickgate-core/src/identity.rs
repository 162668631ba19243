//! Identities, quota state and the durable-store contract.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tier::{QuotaLimit, Tier, TierPolicy};
use crate::TradingDate;

/// One API-key holder. `requests_made` is always relative to
/// `last_request_date`; a stale date invalidates the counter and it is reset
/// lazily on the next quota check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub api_key: String,
    pub tier: Tier,
    pub requests_made: u32,
    pub last_request_date: TradingDate,
}

/// Outcome of the atomic quota check-and-consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Request admitted. `used` is the counter after the increment; zero for
    /// unlimited tiers, which skip counting entirely.
    Allowed { used: u32 },
    /// Daily limit reached; no state was changed.
    Exhausted { limit: u32 },
}

/// Durable-store failure. Carries no storage internals past the gate.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity '{id}' not found")]
    UnknownIdentity { id: String },

    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

/// The only component touching durable identity state.
///
/// `check_and_consume` must behave as a single atomic read-modify-write per
/// identity: two concurrent calls for the same identity must never observe the
/// same pre-increment count.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn resolve(&self, api_key: &str) -> Result<Option<Identity>, StoreError>;

    async fn check_and_consume(
        &self,
        identity_id: &str,
        policy: &TierPolicy,
        today: TradingDate,
    ) -> Result<QuotaDecision, StoreError>;
}

/// Applies the quota algorithm to one identity's state in place. Shared by the
/// in-memory and durable implementations so both expose identical semantics.
///
/// 1. stale `last_request_date` resets the counter to zero for `today`;
/// 2. unlimited tiers allow without counting;
/// 3. at-or-over limit fails with state unchanged;
/// 4. otherwise the counter is incremented and stamped with `today`.
pub fn apply_quota(
    requests_made: &mut u32,
    last_request_date: &mut TradingDate,
    policy: &TierPolicy,
    today: TradingDate,
) -> QuotaDecision {
    if *last_request_date < today {
        *requests_made = 0;
        *last_request_date = today;
    }

    let limit = match policy.daily_quota {
        QuotaLimit::Unlimited => return QuotaDecision::Allowed { used: 0 },
        QuotaLimit::Limited(limit) => limit,
    };

    if *requests_made >= limit {
        return QuotaDecision::Exhausted { limit };
    }

    *requests_made += 1;
    *last_request_date = today;
    QuotaDecision::Allowed {
        used: *requests_made,
    }
}

/// In-memory store used by tests and as the reference semantics. The single
/// mutex is the linearization point for quota updates.
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: Mutex<HashMap<String, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identity: Identity) {
        let mut identities = self
            .identities
            .lock()
            .expect("identity map mutex poisoned");
        identities.insert(identity.id.clone(), identity);
    }

    /// Snapshot of the stored state, for assertions on counter behavior.
    pub fn get(&self, identity_id: &str) -> Option<Identity> {
        self.identities
            .lock()
            .expect("identity map mutex poisoned")
            .get(identity_id)
            .cloned()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn resolve(&self, api_key: &str) -> Result<Option<Identity>, StoreError> {
        let identities = self
            .identities
            .lock()
            .expect("identity map mutex poisoned");
        Ok(identities
            .values()
            .find(|identity| identity.api_key == api_key)
            .cloned())
    }

    async fn check_and_consume(
        &self,
        identity_id: &str,
        policy: &TierPolicy,
        today: TradingDate,
    ) -> Result<QuotaDecision, StoreError> {
        let mut identities = self
            .identities
            .lock()
            .expect("identity map mutex poisoned");
        let identity = identities
            .get_mut(identity_id)
            .ok_or_else(|| StoreError::UnknownIdentity {
                id: identity_id.to_owned(),
            })?;

        Ok(apply_quota(
            &mut identity.requests_made,
            &mut identity.last_request_date,
            policy,
            today,
        ))
    }
}
