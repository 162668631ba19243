//! Core contracts for tickgate.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The tier → capability policy table
//! - The closed indicator registry and dispatch
//! - The lazily-loaded market-data cache
//! - The identity-store contract and the access gate

pub mod cache;
pub mod dataset;
pub mod dispatch;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod identity;
pub mod indicators;
pub mod tier;

pub use cache::MarketDataCache;
pub use dataset::{CandleRow, DatasetError, DatasetSource};
pub use dispatch::{DispatchMiss, IndicatorDispatcher};
pub use domain::{Candle, DateWindow, SeriesPoint, Symbol, TradingDate};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{CoreError, ValidationError};
pub use gate::{AccessGate, GateError, GateRequest, IndicatorResponse};
pub use identity::{Identity, IdentityStore, MemoryIdentityStore, QuotaDecision, StoreError};
pub use indicators::{compute_series, IndicatorId, IndicatorParams};
pub use tier::{policy_for, HistoryWindow, QuotaLimit, Tier, TierPolicy, PREMIUM_EPOCH};
