//! Request orchestration: identity → authorization → window → quota → dispatch.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cache::MarketDataCache;
use crate::dispatch::IndicatorDispatcher;
use crate::identity::{IdentityStore, QuotaDecision, StoreError};
use crate::indicators::{IndicatorId, IndicatorParams};
use crate::tier::Tier;
use crate::{SeriesPoint, Symbol, TradingDate, ValidationError};

/// Inbound call contract from the (external) transport layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GateRequest {
    pub api_key: String,
    pub indicator: String,
    pub symbol: String,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

/// Successful gate response: the normalized indicator series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResponse {
    pub symbol: Symbol,
    pub indicator: IndicatorId,
    pub data: Vec<SeriesPoint>,
}

/// Terminal request failures, one per pipeline stage. The gate never retries;
/// every stage is a bounded decision point.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid API key")]
    Unauthenticated,

    #[error("{tier} tier does not allow indicator '{indicator}'")]
    Forbidden { tier: Tier, indicator: String },

    #[error("daily request limit of {limit} reached; upgrade or wait for the daily reset")]
    QuotaExceeded { limit: u32 },

    #[error("data not found for symbol '{symbol}'")]
    NotFound { symbol: String },

    #[error(transparent)]
    InvalidRequest(#[from] ValidationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "gate.unauthenticated",
            Self::Forbidden { .. } => "gate.forbidden",
            Self::QuotaExceeded { .. } => "gate.quota_exceeded",
            Self::NotFound { .. } => "gate.not_found",
            Self::InvalidRequest(_) => "gate.invalid_request",
            Self::Internal(_) => "gate.internal",
        }
    }

    /// HTTP-equivalent status for transport layers.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden { .. } => 403,
            Self::QuotaExceeded { .. } => 429,
            Self::NotFound { .. } => 404,
            Self::InvalidRequest(_) => 400,
            Self::Internal(_) => 500,
        }
    }
}

impl From<StoreError> for GateError {
    fn from(error: StoreError) -> Self {
        // Storage details stay behind the gate.
        match error {
            StoreError::UnknownIdentity { .. } => {
                Self::Internal(String::from("identity vanished during quota check"))
            }
            StoreError::Unavailable(_) => {
                Self::Internal(String::from("identity store unavailable"))
            }
        }
    }
}

/// Orchestrates one request end to end, terminal at the first failing stage.
/// Quota is consumed before dispatch, so a later NotFound still costs one
/// request ("pay to ask").
pub struct AccessGate {
    store: Arc<dyn IdentityStore>,
    dispatcher: IndicatorDispatcher,
}

impl AccessGate {
    pub fn new(store: Arc<dyn IdentityStore>, cache: MarketDataCache) -> Self {
        Self {
            store,
            dispatcher: IndicatorDispatcher::new(cache),
        }
    }

    pub fn cache(&self) -> &MarketDataCache {
        self.dispatcher.cache()
    }

    pub async fn handle(&self, request: &GateRequest) -> Result<IndicatorResponse, GateError> {
        self.handle_at(request, TradingDate::today_utc()).await
    }

    /// Like [`handle`](Self::handle) with an explicit request date. "today" is
    /// evaluated exactly once per request so window derivation and the quota
    /// stamp can never straddle a day boundary.
    pub async fn handle_at(
        &self,
        request: &GateRequest,
        today: TradingDate,
    ) -> Result<IndicatorResponse, GateError> {
        let identity = self
            .store
            .resolve(&request.api_key)
            .await?
            .ok_or(GateError::Unauthenticated)?;
        let policy = identity.tier.policy();

        // Unregistered names fail here too: authorization owns name
        // validation so nothing unknown reaches the computation layer.
        let indicator = IndicatorId::from_str(&request.indicator).map_err(|_| {
            GateError::Forbidden {
                tier: identity.tier,
                indicator: request.indicator.trim().to_ascii_lowercase(),
            }
        })?;
        if !policy.allows(indicator) {
            return Err(GateError::Forbidden {
                tier: identity.tier,
                indicator: indicator.as_str().to_owned(),
            });
        }

        let params = IndicatorParams::from_map(indicator, &request.params)?;
        let window = policy.window_for(today);

        match self
            .store
            .check_and_consume(&identity.id, policy, today)
            .await?
        {
            QuotaDecision::Allowed { used } => {
                debug!(
                    identity = %identity.id,
                    tier = %identity.tier,
                    %indicator,
                    used,
                    "request admitted"
                );
            }
            QuotaDecision::Exhausted { limit } => {
                return Err(GateError::QuotaExceeded { limit });
            }
        }

        let (symbol, data) = self
            .dispatcher
            .compute(&request.symbol, indicator, window, &params)
            .await
            .map_err(|miss| GateError::NotFound { symbol: miss.symbol })?;

        Ok(IndicatorResponse {
            symbol,
            indicator,
            data,
        })
    }
}
