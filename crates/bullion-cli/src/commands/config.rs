use bullion_core::BullionConfig;

use crate::commands::CommandResult;
use crate::error::CliError;

/// Warnings are reported once, in the envelope metadata.
pub fn run(config: &BullionConfig) -> Result<CommandResult, CliError> {
    let mut summary = config.summary();
    summary.warnings.clear();
    Ok(CommandResult::ok(serde_json::to_value(summary)?))
}
