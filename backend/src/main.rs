use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use leafdoc::advisory::{AdvisoryGenerator, HttpChatClient};
use leafdoc::config::AppConfig;
use leafdoc::inference::engine::load_classifier;
use leafdoc::pipeline::PredictionService;
use leafdoc::routes::configure_routes;
use leafdoc::upload::{UploadPolicy, UploadStore};
use std::env;
use std::sync::Arc;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    log::error!("{}: {}", context, err);
    std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| startup_error("Invalid configuration", e))?;

    log::info!(
        "Loading classifier from {}",
        config.classifier.model_path.display()
    );
    let engine = load_classifier(
        &config.classifier.model_path,
        config.classifier.apply_softmax,
    )
    .map_err(|e| startup_error("Model loading failed", e))?;

    let chat_client = HttpChatClient::new(&config.advisory)
        .map_err(|e| startup_error("Failed to build advisory client", e))?;
    let advisory = AdvisoryGenerator::new(Arc::new(chat_client), &config.advisory);

    let store = UploadStore::new(config.upload.dir.clone());
    store
        .ensure_dir()
        .map_err(|e| startup_error("Failed to create upload directory", e))?;
    let upload_dir = store.dir().to_path_buf();

    let service = web::Data::new(PredictionService::new(
        engine,
        Arc::new(advisory),
        store,
        UploadPolicy::from(&config.upload),
    ));

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(service.clone())
            .configure(|cfg| configure_routes(cfg, upload_dir.clone()))
    });
    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }
    server.bind(&bind_address)?.run().await
}
