use serde::{Deserialize, Serialize};

use crate::domain::price::validate_non_negative;
use crate::{Interval, UtcDateTime, ValidationError};

/// A recommendation produced by the analysis layer, with the inputs behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub generated_at: UtcDateTime,
    pub interval_used: Interval,
    pub hours_analyzed: u32,
    pub reference_price: Option<f64>,
    pub recommendation_text: String,
    pub input_data_point_count: u64,
    pub succeeded: bool,
}

impl Recommendation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hours_analyzed == 0 {
            return Err(ValidationError::NotPositive {
                field: "hours_analyzed",
            });
        }
        if let Some(price) = self.reference_price {
            validate_non_negative("reference_price", price)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecommendation {
    pub id: i64,
    #[serde(flatten)]
    pub recommendation: Recommendation,
}
