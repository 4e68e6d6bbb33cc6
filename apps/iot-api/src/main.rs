//! 传感器数据采集与查询服务。
//!
//! 同一进程内运行两部分：
//! - MQTT 订阅任务：解码上行报文并写入 `sensor_data`
//! - HTTP 查询接口：读取已落库数据、聚合、连接状态与采集计数

mod handlers;
mod ingest;
mod middleware;
mod routes;
mod utils;

use axum::{Router, middleware::from_fn};
use iot_auth::{AuthService, JwtManager};
use iot_config::AppConfig;
use iot_ingest::StatusRegister;
use iot_storage::{PgSampleStore, SampleStore, connect_pool, ensure_schema};
use iot_telemetry::init_tracing;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::ingest::spawn_ingest;
use crate::middleware::request_context;
use crate::routes::create_api_router;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SampleStore>,
    pub status: Arc<StatusRegister>,
    pub auth: Arc<AuthService>,
    pub auth_required: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    let pool = connect_pool(&config.database_url, config.database_max_connections).await?;
    ensure_schema(&pool, config.store_timescale).await?;
    let store: Arc<dyn SampleStore> = Arc::new(PgSampleStore::new(pool, config.store_timescale));
    let status = Arc::new(StatusRegister::new());

    let subscriber = spawn_ingest(&config, store.clone(), status.clone());

    if config.auth_required && config.jwt_secret == "change-me" {
        warn!(target: "iot.api", "jwt_secret_default");
    }
    let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_ttl_seconds);
    let auth = Arc::new(AuthService::new(
        config.auth_username.clone(),
        config.auth_password.clone(),
        jwt,
    ));
    let state = AppState {
        store,
        status,
        auth,
        auth_required: config.auth_required,
    };

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(
        target: "iot.api",
        addr = %config.http_addr,
        auth_required = config.auth_required,
        "http_listening"
    );
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(subscriber) = subscriber {
        subscriber.shutdown().await;
    }
    info!(target: "iot.api", "shutdown_complete");
    Ok(())
}

/// 装配路由与全局中间件。
pub fn build_app(state: AppState) -> Router {
    create_api_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        // 注入 request_id/trace_id
        .layer(from_fn(request_context))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: "iot.api", error = %err, "ctrl_c_listen_failed");
    }
    info!(target: "iot.api", "shutdown_requested");
}


#[cfg(test)]
mod tests {
    use super::build_app;
    use super::test_support::{body_json, state_with};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use iot_storage::InMemorySampleStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_route_carries_request_ids() {
        let app = build_app(state_with(Arc::new(InMemorySampleStore::new()), true));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-trace-id"));
        let body = body_json(response).await;
        assert_eq!(body["data"]["status"], "running");
    }

    #[tokio::test]
    async fn protected_route_requires_token_when_enabled() {
        let app = build_app(state_with(Arc::new(InMemorySampleStore::new()), true));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/data")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_route_accepts_form_and_unlocks_queries() {
        let app = build_app(state_with(Arc::new(InMemorySampleStore::new()), true));
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/token")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=admin&password=admin"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["token_type"], "bearer");
        let token = body["data"]["access_token"]
            .as_str()
            .expect("token")
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/mqtt/status")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["connected"], false);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = build_app(state_with(Arc::new(InMemorySampleStore::new()), false));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://dashboard.local")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );
    }
}
