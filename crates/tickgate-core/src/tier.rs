//! Subscription tiers and the tier → capability table.
//!
//! All tier branching in the service goes through [`TierPolicy`]; the table is
//! a constant data artifact so the tier/feature mapping is testable on its own.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::date;

use crate::{DateWindow, IndicatorId, TradingDate, ValidationError};

/// Earliest date Premium identities may query; the dataset starts here.
pub const PREMIUM_EPOCH: TradingDate = TradingDate::from_date(date!(2020 - 01 - 01));

/// Subscription level, totally ordered by capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
    Premium,
}

impl Tier {
    pub const ALL: [Self; 3] = [Self::Free, Self::Pro, Self::Premium];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Premium => "premium",
        }
    }

    pub const fn policy(self) -> &'static TierPolicy {
        policy_for(self)
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "premium" => Ok(Self::Premium),
            other => Err(ValidationError::InvalidTier {
                value: other.to_owned(),
            }),
        }
    }
}

/// Historical depth a tier may query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryWindow {
    /// Rolling window ending today.
    Days(u32),
    /// Everything since a fixed epoch date.
    SinceEpoch(TradingDate),
}

/// Daily request budget for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaLimit {
    Limited(u32),
    Unlimited,
}

/// Per-tier capability record, constant for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierPolicy {
    pub tier: Tier,
    pub allowed: &'static [IndicatorId],
    pub history: HistoryWindow,
    pub daily_quota: QuotaLimit,
}

const FREE_POLICY: TierPolicy = TierPolicy {
    tier: Tier::Free,
    allowed: &[IndicatorId::Sma, IndicatorId::Ema],
    history: HistoryWindow::Days(90),
    daily_quota: QuotaLimit::Limited(50),
};

const PRO_POLICY: TierPolicy = TierPolicy {
    tier: Tier::Pro,
    allowed: &[
        IndicatorId::Sma,
        IndicatorId::Ema,
        IndicatorId::Rsi,
        IndicatorId::Macd,
    ],
    history: HistoryWindow::Days(365),
    daily_quota: QuotaLimit::Limited(500),
};

const PREMIUM_POLICY: TierPolicy = TierPolicy {
    tier: Tier::Premium,
    allowed: &IndicatorId::ALL,
    history: HistoryWindow::SinceEpoch(PREMIUM_EPOCH),
    daily_quota: QuotaLimit::Unlimited,
};

pub const fn policy_for(tier: Tier) -> &'static TierPolicy {
    match tier {
        Tier::Free => &FREE_POLICY,
        Tier::Pro => &PRO_POLICY,
        Tier::Premium => &PREMIUM_POLICY,
    }
}

impl TierPolicy {
    pub fn allows(&self, indicator: IndicatorId) -> bool {
        self.allowed.contains(&indicator)
    }

    /// Permitted query window for a request made on `today`.
    pub fn window_for(&self, today: TradingDate) -> DateWindow {
        let start = match self.history {
            HistoryWindow::Days(days) => today.minus_days(days),
            HistoryWindow::SinceEpoch(epoch) => epoch,
        };
        DateWindow { start, end: today }
    }
}
