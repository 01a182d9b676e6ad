use bullion_core::{Recommendation, RecommendationLedger, UtcDateTime, Warehouse};
use serde_json::json;

use crate::cli::{RecommendationsArgs, RecommendationsCommand, RecordArgs};
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn run(args: &RecommendationsArgs, warehouse: Warehouse) -> Result<CommandResult, CliError> {
    let ledger = RecommendationLedger::new(warehouse);
    match &args.command {
        RecommendationsCommand::List(args) => {
            let entries = if args.successful {
                ledger.recent_successful(args.limit)?
            } else {
                ledger.recent(args.limit)?
            };
            Ok(CommandResult::ok(serde_json::to_value(entries)?))
        }
        RecommendationsCommand::Record(args) => {
            let entry = recommendation(args, UtcDateTime::now());
            let id = ledger.record(&entry)?;
            Ok(CommandResult::ok(json!({ "id": id, "recommendation": entry })))
        }
    }
}

fn recommendation(args: &RecordArgs, generated_at: UtcDateTime) -> Recommendation {
    Recommendation {
        generated_at,
        interval_used: args.interval,
        hours_analyzed: args.hours,
        reference_price: args.price,
        recommendation_text: args.text.clone(),
        input_data_point_count: args.points,
        succeeded: !args.failed,
    }
}
