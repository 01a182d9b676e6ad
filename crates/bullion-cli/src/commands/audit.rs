use bullion_core::{CacheReader, Warehouse};

use crate::cli::AuditArgs;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn run(args: &AuditArgs, warehouse: Warehouse) -> Result<CommandResult, CliError> {
    let entries = CacheReader::new(warehouse).audit(args.target.as_deref(), args.limit)?;
    Ok(CommandResult::ok(serde_json::to_value(entries)?))
}
