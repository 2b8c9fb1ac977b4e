use std::path::Path;

use super::labels::NUM_CLASSES;
use super::preprocess::PreprocessedTensor;

/// Allowed drift of the probability sum from 1.
pub const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("model error: {0}")]
    Model(String),
    #[error("expected {expected} class scores, model returned {actual}")]
    OutputShape { expected: usize, actual: usize },
    #[error("invalid probability vector: {0}")]
    InvalidProbabilities(String),
}

/// Opaque scoring function. Implementations are loaded once at startup and
/// shared read-only between requests.
pub trait ClassifierEngine: Send + Sync {
    /// Returns one score per class label, in label order.
    fn score(&self, tensor: &PreprocessedTensor) -> Result<Vec<f32>, InferenceError>;
}

/// Checks the engine output is a usable probability vector.
pub fn validate_probabilities(scores: &[f32]) -> Result<(), InferenceError> {
    if scores.len() != NUM_CLASSES {
        return Err(InferenceError::OutputShape {
            expected: NUM_CLASSES,
            actual: scores.len(),
        });
    }
    if let Some((idx, p)) = scores
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(InferenceError::InvalidProbabilities(format!(
            "score {} at index {} is outside [0, 1]",
            p, idx
        )));
    }
    let sum: f32 = scores.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(InferenceError::InvalidProbabilities(format!(
            "scores sum to {}",
            sum
        )));
    }
    Ok(())
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Loads the configured classifier artifact. Only available when the crate is
/// built with the `libtorch` feature.
#[cfg(feature = "libtorch")]
pub fn load_classifier(
    path: &Path,
    apply_softmax: bool,
) -> Result<std::sync::Arc<dyn ClassifierEngine>, InferenceError> {
    let model = torch::TorchClassifier::load(path, apply_softmax)?;
    Ok(std::sync::Arc::new(model))
}

#[cfg(not(feature = "libtorch"))]
pub fn load_classifier(
    path: &Path,
    _apply_softmax: bool,
) -> Result<std::sync::Arc<dyn ClassifierEngine>, InferenceError> {
    Err(InferenceError::Load {
        path: path.display().to_string(),
        reason: "no classifier backend compiled in; rebuild with --features libtorch".into(),
    })
}

#[cfg(feature = "libtorch")]
pub mod torch {
    use std::path::Path;
    use std::sync::Mutex;

    use tch::{CModule, Device, Kind, Tensor};

    use super::{ClassifierEngine, InferenceError, softmax};
    use crate::inference::preprocess::{PreprocessedTensor, TENSOR_SHAPE};

    /// TorchScript export of the leaf classifier. Takes NHWC input.
    pub struct TorchClassifier {
        model: Mutex<CModule>,
        device: Device,
        apply_softmax: bool,
    }

    impl TorchClassifier {
        pub fn load(path: &Path, apply_softmax: bool) -> Result<Self, InferenceError> {
            let device = Device::cuda_if_available();
            let mut model =
                CModule::load_on_device(path, device).map_err(|e| InferenceError::Load {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            model.set_eval();
            log::info!("Loaded classifier {} on {:?}", path.display(), device);
            Ok(Self {
                model: Mutex::new(model),
                device,
                apply_softmax,
            })
        }
    }

    impl ClassifierEngine for TorchClassifier {
        fn score(&self, tensor: &PreprocessedTensor) -> Result<Vec<f32>, InferenceError> {
            let shape = TENSOR_SHAPE.map(|d| d as i64);
            let input = Tensor::from_slice(tensor.as_slice())
                .view(shape)
                .to_device(self.device);

            let output = {
                let model = self
                    .model
                    .lock()
                    .map_err(|_| InferenceError::Model("model lock poisoned".into()))?;
                tch::no_grad(|| model.forward_ts(&[input]))
                    .map_err(|e| InferenceError::Model(e.to_string()))?
            };
            let output_flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
            let scores = Vec::<f32>::try_from(&output_flat)
                .map_err(|e| InferenceError::Model(e.to_string()))?;

            Ok(if self.apply_softmax {
                softmax(&scores)
            } else {
                scores
            })
        }
    }
}
