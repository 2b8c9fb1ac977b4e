use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use serde_json::json;
use std::path::PathBuf;

use crate::error::AppError;
use crate::inference::labels::NUM_CLASSES;
use crate::pipeline::PredictionService;
use crate::upload::{UPLOAD_URL_PREFIX, read_upload};

pub fn configure_routes(cfg: &mut web::ServiceConfig, upload_dir: PathBuf) {
    cfg.service(web::resource("/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(Files::new(UPLOAD_URL_PREFIX, upload_dir));
}

async fn handle_predict(
    service: web::Data<PredictionService>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let upload = read_upload(payload, service.policy()).await?;
    let response = service.predict(upload).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "classes": NUM_CLASSES,
    }))
}
