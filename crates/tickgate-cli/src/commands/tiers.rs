use serde::Serialize;

use tickgate_core::tier::{policy_for, Tier, TierPolicy};

use super::CommandResult;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct TiersResponseData {
    tiers: Vec<&'static TierPolicy>,
}

pub fn run() -> Result<CommandResult, CliError> {
    let tiers = Tier::ALL.into_iter().map(policy_for).collect();
    let data = serde_json::to_value(TiersResponseData { tiers })?;
    Ok(CommandResult::ok(data))
}
