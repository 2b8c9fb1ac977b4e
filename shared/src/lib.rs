use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Risk tier derived from the top-1 confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RankedEntry {
    #[serde(rename = "class")]
    pub class_name: String,
    /// Percentage, rounded to two decimals.
    pub confidence: f64,
    pub is_healthy: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub success: bool,
    pub prediction: String,
    pub confidence: f64,
    pub is_healthy: bool,
    pub risk_level: RiskLevel,
    pub image_url: String,
    pub all_predictions: Vec<RankedEntry>,
    pub llm_advisory: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
