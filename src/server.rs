//! HTTP surface for the orchestrator. Failures are part of the outcome
//! record, so `/api/generate` answers 200 whenever the body parses.

use crate::{error::ImaginError, orchestrator::Orchestrator};
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub prompt: String,
}

pub async fn generate(
    orchestrator: web::Data<Orchestrator>,
    body: web::Json<GenerateBody>,
) -> ActixResult<HttpResponse> {
    log::info!("🎨 Image generation request received");
    let outcome = orchestrator.handle_generate(&body.prompt).await;
    Ok(HttpResponse::Ok().json(outcome))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/generate", web::post().to(generate))
        .route("/health", web::get().to(health));
}

pub async fn serve(orchestrator: Arc<Orchestrator>, port: u16) -> Result<(), ImaginError> {
    let data = web::Data::from(orchestrator);

    log::info!("🌐 Listening on http://0.0.0.0:{}", port);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(("0.0.0.0", port))
        .map_err(|e| ImaginError::ConfigError(format!("Cannot bind port {}: {}", port, e)))?
        .run()
        .await
        .map_err(|e| ImaginError::ConfigError(format!("Server error: {}", e)))
}
