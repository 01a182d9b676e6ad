use tracing::info;

use bullion_warehouse::Warehouse;

use crate::records::{recommendation_from_stored, recommendation_to_record};
use crate::{CoreError, Recommendation, StoredRecommendation};

/// Append-only log of recommendations and the inputs behind them.
///
/// The ledger does not interpret recommendation content.
#[derive(Clone)]
pub struct RecommendationLedger {
    warehouse: Warehouse,
}

impl RecommendationLedger {
    pub fn new(warehouse: Warehouse) -> Self {
        Self { warehouse }
    }

    pub fn record(&self, entry: &Recommendation) -> Result<i64, CoreError> {
        entry.validate()?;
        let id = self
            .warehouse
            .insert_recommendation(&recommendation_to_record(entry))?;
        info!(
            id,
            interval = %entry.interval_used,
            succeeded = entry.succeeded,
            "recorded recommendation"
        );
        Ok(id)
    }

    /// Most recent first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredRecommendation>, CoreError> {
        self.history(limit, false)
    }

    /// Most recent first, failed generations excluded.
    pub fn recent_successful(&self, limit: usize) -> Result<Vec<StoredRecommendation>, CoreError> {
        self.history(limit, true)
    }

    fn history(
        &self,
        limit: usize,
        succeeded_only: bool,
    ) -> Result<Vec<StoredRecommendation>, CoreError> {
        self.warehouse
            .recent_recommendations(limit, succeeded_only)?
            .into_iter()
            .map(|stored| recommendation_from_stored(stored).map_err(CoreError::from))
            .collect()
    }
}
