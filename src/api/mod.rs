//! Read-only admin endpoints.
//!
//! This module exposes the per-face statistics, the strategy configuration
//! and the Prometheus metrics of a running node over HTTP.

use std::sync::Arc;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use anyhow::Context;
use log::info;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use serde_json::json;

use crate::core::stats::{lock_stats, SharedStats};
use crate::core::{FaceId, FaceReport};
use crate::models::{ServerConfig, StrategyConfig};

pub struct ApiState {
    pub stats: SharedStats,
    pub config: Arc<StrategyConfig>,
    pub prometheus: Option<PrometheusHandle>,
}

/// API configuration function for Actix-web
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::resource("/health").route(web::get().to(health_check)))
            .service(web::resource("/config").route(web::get().to(strategy_config)))
            .service(web::resource("/faces").route(web::get().to(list_faces)))
            .service(web::resource("/faces/{id}").route(web::get().to(get_face)))
    )
    .service(web::resource("/metrics").route(web::get().to(render_metrics)));
}

/// Health check endpoint response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn strategy_config(state: web::Data<ApiState>) -> impl Responder {
    HttpResponse::Ok().json(state.config.as_ref())
}

/// All faces with their counters and limits
async fn list_faces(state: web::Data<ApiState>) -> impl Responder {
    let body = {
        let store = lock_stats(&state.stats);
        json!({
            "max_table_size": store.max_table_size(),
            "window_resets": store.window_resets(),
            "pending_underflows": store.pending_underflows(),
            "faces": store.reports(),
        })
    };
    HttpResponse::Ok().json(body)
}

async fn get_face(state: web::Data<ApiState>, path: web::Path<u64>) -> impl Responder {
    let id = FaceId(path.into_inner());
    let report = lock_stats(&state.stats).record(id).map(FaceReport::from);
    match report {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => HttpResponse::NotFound().json(json!({ "error": e.to_string() })),
    }
}

async fn render_metrics(state: web::Data<ApiState>) -> impl Responder {
    match &state.prometheus {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::NotFound().finish(),
    }
}

/// Install the global Prometheus recorder
pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Serve the admin endpoints until the server stops
pub async fn serve(state: ApiState, server: &ServerConfig) -> anyhow::Result<()> {
    let state = web::Data::new(state);
    info!("Admin API listening on {}:{}", server.host, server.port);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(config))
        .bind((server.host.as_str(), server.port))
        .with_context(|| format!("Failed to bind {}:{}", server.host, server.port))?
        .run()
        .await
        .context("Admin API server failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use actix_web::{test, App};
    use crate::core::stats::{FaceStatsStore, ThresholdPair};
    use crate::core::Face;

    fn state_with(face: &Face) -> web::Data<ApiState> {
        let stats = FaceStatsStore::shared(100);
        {
            let mut store = lock_stats(&stats);
            store
                .register(face, Duration::ZERO, ThresholdPair::initial(3.0, 0.125, 100))
                .unwrap();
            store.record_pending_created(face.id()).unwrap();
        }
        web::Data::new(ApiState {
            stats,
            config: Arc::new(StrategyConfig::default()),
            prometheus: Some(PrometheusBuilder::new().build_recorder().handle()),
        })
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().configure(config)).await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_list_faces() {
        let face = Face::network("eth0");
        let app = test::init_service(App::new().app_data(state_with(&face)).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/v1/faces").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["max_table_size"], 100);
        assert_eq!(body["faces"][0]["id"], face.id().0);
        assert_eq!(body["faces"][0]["kind"], "network");
        assert_eq!(body["faces"][0]["pending_entries"], 1);
        assert_eq!(body["faces"][0]["occupancy_limit"], 12.5);
    }

    #[actix_web::test]
    async fn test_unknown_face() {
        let face = Face::network("eth0");
        let app = test::init_service(App::new().app_data(state_with(&face)).configure(config)).await;

        let uri = format!("/api/v1/faces/{}", face.id().0);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri("/api/v1/faces/999999999").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_config_and_metrics() {
        let face = Face::network("eth0");
        let app = test::init_service(App::new().app_data(state_with(&face)).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/v1/config").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["alert_name"], "/pushback/alerts");

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[::core::prelude::v1::test]
    fn prometheus_recorder_installs_once() {
        let handle = install_prometheus().unwrap();
        metrics::increment_counter!("poseidon_admin_smoke_total");
        assert!(handle.render().contains("poseidon_admin_smoke_total"));

        assert!(install_prometheus().is_err());
    }

    #[actix_web::test]
    async fn serve_reports_bind_failure() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
        };
        let state = ApiState {
            stats: FaceStatsStore::shared(100),
            config: Arc::new(StrategyConfig::default()),
            prometheus: None,
        };

        let err = serve(state, &server).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind"));
    }
}
