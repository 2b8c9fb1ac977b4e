use actix_web::web;
use std::sync::Arc;

use shared::{PredictionResponse, RiskLevel};

use crate::advisory::{AdvisoryError, AdvisoryGenerator, degraded_advisory};
use crate::error::AppError;
use crate::inference::engine::{ClassifierEngine, validate_probabilities};
use crate::inference::preprocess::preprocess_path;
use crate::inference::ranker::{RankedPrediction, rank};
use crate::inference::risk;
use crate::upload::{StoredUpload, UploadPolicy, UploadStore, UploadedFile};

/// Request-path services, built once at startup and shared by every worker.
pub struct PredictionService {
    engine: Arc<dyn ClassifierEngine>,
    advisory: Arc<AdvisoryGenerator>,
    store: UploadStore,
    policy: UploadPolicy,
}

impl PredictionService {
    pub fn new(
        engine: Arc<dyn ClassifierEngine>,
        advisory: Arc<AdvisoryGenerator>,
        store: UploadStore,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            engine,
            advisory,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub async fn predict(&self, upload: UploadedFile) -> Result<PredictionResponse, AppError> {
        let engine = self.engine.clone();
        let store = self.store.clone();
        let (stored, ranked) = web::block(move || classify_upload(&store, engine.as_ref(), upload))
            .await
            .map_err(|e| AppError::Blocking(e.to_string()))??;

        let risk = risk::classify(ranked.top.probability);
        log::info!(
            "Predicted {} ({:.2}%, risk {}) for {:?} ({}, {} bytes, stored as {})",
            ranked.top.label.name,
            ranked.top.confidence_percent(),
            risk,
            stored.original_filename,
            stored.extension,
            stored.size,
            stored.stored_name
        );

        let advisory = self.advisory_for(&ranked).await;
        Ok(assemble(&stored, &ranked, risk, advisory))
    }

    /// Runs the advisory call on its own task so a slow service only delays
    /// this response.
    async fn advisory_for(&self, ranked: &RankedPrediction) -> String {
        let generator = self.advisory.clone();
        let disease = ranked.top.label.name;
        let confidence = ranked.top.probability;
        actix_web::rt::spawn(async move { generator.generate(disease, confidence).await })
            .await
            .unwrap_or_else(|e| degraded_advisory(&AdvisoryError::Task(e.to_string())))
    }
}

/// Saves the upload and scores it. The stored file is removed again if any
/// later stage fails.
fn classify_upload(
    store: &UploadStore,
    engine: &dyn ClassifierEngine,
    upload: UploadedFile,
) -> Result<(StoredUpload, RankedPrediction), AppError> {
    let stored = store.save(&upload.name, &upload.bytes)?;
    match score_stored(engine, &stored) {
        Ok(ranked) => Ok((stored, ranked)),
        Err(err) => {
            store.remove(&stored);
            Err(err)
        }
    }
}

fn score_stored(
    engine: &dyn ClassifierEngine,
    stored: &StoredUpload,
) -> Result<RankedPrediction, AppError> {
    let tensor = preprocess_path(&stored.path)?;
    let scores = engine.score(&tensor)?;
    validate_probabilities(&scores)?;
    Ok(rank(&scores)?)
}

/// Builds the success body. Every field is filled from a completed stage.
pub fn assemble(
    stored: &StoredUpload,
    ranked: &RankedPrediction,
    risk_level: RiskLevel,
    llm_advisory: String,
) -> PredictionResponse {
    PredictionResponse {
        success: true,
        prediction: ranked.top.label.name.to_string(),
        confidence: ranked.top.confidence_percent(),
        is_healthy: ranked.top.label.healthy,
        risk_level,
        image_url: stored.url(),
        all_predictions: ranked.top_k.iter().map(|p| p.to_entry()).collect(),
        llm_advisory,
    }
}
