use shared::RankedEntry;

use super::engine::InferenceError;
use super::labels::{ClassLabel, NUM_CLASSES, label};

pub const TOP_K: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionScore {
    pub index: usize,
    pub label: &'static ClassLabel,
    pub probability: f32,
}

impl PredictionScore {
    /// Probability as a percentage rounded to two decimals.
    pub fn confidence_percent(&self) -> f64 {
        round_percent(self.probability)
    }

    pub fn to_entry(&self) -> RankedEntry {
        RankedEntry {
            class_name: self.label.name.to_string(),
            confidence: self.confidence_percent(),
            is_healthy: self.label.healthy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPrediction {
    pub top: PredictionScore,
    /// `min(TOP_K, NUM_CLASSES)` entries, descending, ties by ascending index.
    pub top_k: Vec<PredictionScore>,
}

pub fn round_percent(probability: f32) -> f64 {
    (f64::from(probability) * 100.0 * 100.0).round() / 100.0
}

pub fn rank(scores: &[f32]) -> Result<RankedPrediction, InferenceError> {
    if scores.len() != NUM_CLASSES {
        return Err(InferenceError::OutputShape {
            expected: NUM_CLASSES,
            actual: scores.len(),
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    let top_k: Vec<PredictionScore> = order
        .into_iter()
        .take(TOP_K.min(NUM_CLASSES))
        .filter_map(|index| {
            label(index).map(|label| PredictionScore {
                index,
                label,
                probability: scores[index],
            })
        })
        .collect();

    // argmax with first-index-wins agrees with the head of the sorted list
    let top = top_k[0];
    Ok(RankedPrediction { top, top_k })
}
