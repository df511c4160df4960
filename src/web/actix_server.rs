//! Actix-web server exposing the coordinator over HTTP. Grounded on
//! `phantom-cve-core/src/web/actix_server.rs`'s
//! `AppState`/`web::scope`/`ApiResponse` idiom.

use crate::coordinator::Coordinator;
use crate::error::CoordinatorError;
use crate::models::ThreatSignal;
use crate::store::SharedStore;
use crate::web::responses::{ApiResponse, ErrorResponse};
use actix_web::{web, App, HttpResponse, HttpServer};
use serde::Deserialize;
use std::sync::Arc;

pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub store: Arc<dyn SharedStore>,
}

pub async fn start_server(coordinator: Arc<Coordinator>, store: Arc<dyn SharedStore>, bind_address: &str) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState { coordinator, store });

    HttpServer::new(move || {
        App::new().app_data(app_state.clone()).service(
            web::scope("/api")
                .route("/threats/trigger", web::post().to(trigger))
                .route("/threats", web::get().to(recent))
                .route("/threats/{id}", web::get().to(by_id)),
        )
        .route("/health", web::get().to(health))
        .route("/ready", web::get().to(ready))
    })
    .workers(num_cpus::get())
    .bind(bind_address)?
    .run()
    .await
}

async fn trigger(signal: web::Json<ThreatSignal>, data: web::Data<AppState>) -> HttpResponse {
    match data.coordinator.analyze(signal.into_inner()).await {
        Ok(record) => HttpResponse::Ok().json(ApiResponse::success(record)),
        Err(CoordinatorError::InvalidSignal(msg)) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(ErrorResponse::validation_error(&msg)))
        }
        Err(CoordinatorError::Timeout(ms)) => HttpResponse::GatewayTimeout().json(ApiResponse::<()>::error(
            ErrorResponse::timeout(&format!("analysis exceeded {ms}ms")),
        )),
        Err(e) => HttpResponse::InternalServerError().json(ApiResponse::<()>::error(ErrorResponse::internal_error(&e.to_string()))),
    }
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

async fn recent(query: web::Query<RecentQuery>, data: web::Data<AppState>) -> HttpResponse {
    let records = data.store.recent(query.limit.unwrap_or(50)).await;
    HttpResponse::Ok().json(ApiResponse::success(records))
}

async fn by_id(path: web::Path<String>, data: web::Data<AppState>) -> HttpResponse {
    match data.store.by_id(&path.into_inner()).await {
        Some(record) => HttpResponse::Ok().json(ApiResponse::success(record)),
        None => HttpResponse::NotFound().json(ApiResponse::<()>::error(ErrorResponse::not_found("no record with that id"))),
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "status": "healthy",
        "service": "threat-signal-coordinator",
    })))
}

async fn ready() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "status": "ready" })))
}
