use std::str::FromStr;

use serde_json::json;
use uuid::Uuid;

use tickgate_core::tier::Tier;
use tickgate_store::{resolve_dataset_path, DuckDbIdentityStore};

use super::CommandResult;
use crate::cli::InitArgs;
use crate::error::CliError;

pub fn run(args: &InitArgs) -> Result<CommandResult, CliError> {
    let store = DuckDbIdentityStore::open_default()
        .map_err(|error| CliError::Command(error.to_string()))?;

    let mut data = json!({
        "db_path": store.db_path().display().to_string(),
        "dataset_path": resolve_dataset_path().display().to_string(),
    });

    if let Some(tier_text) = &args.register {
        let tier = Tier::from_str(tier_text)?;
        let api_key = Uuid::new_v4().simple().to_string();
        let identity = store
            .insert_identity(api_key.as_str(), tier)
            .map_err(|error| CliError::Command(error.to_string()))?;

        data["registered"] = json!({
            "id": identity.id,
            "api_key": api_key,
            "tier": tier.as_str(),
        });
    }

    Ok(CommandResult::ok(data))
}
