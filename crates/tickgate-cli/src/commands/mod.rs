mod indicator;
mod init;
mod symbols;
mod tiers;

use std::time::Instant;

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use tickgate_core::{Envelope, EnvelopeError, EnvelopeMeta};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub error: Option<EnvelopeError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self { data, error: None }
    }

    pub fn failed(data: Value, error: EnvelopeError) -> Self {
        Self {
            data,
            error: Some(error),
        }
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Indicator(args) => indicator::run(cli, args).await?,
        Command::Symbols => symbols::run().await?,
        Command::Tiers => tiers::run()?,
        Command::Init(args) => init::run(args)?,
    };

    let meta = EnvelopeMeta::new(
        Uuid::new_v4().to_string(),
        generated_at()?,
        started.elapsed().as_millis() as u64,
    )?;

    Ok(match command_result.error {
        None => Envelope::success(meta, command_result.data),
        Some(error) => Envelope::failure(meta, command_result.data, error),
    })
}

fn generated_at() -> Result<String, CliError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|error| CliError::Command(format!("clock formatting failed: {error}")))
}
