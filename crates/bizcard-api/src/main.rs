//! 명함 디렉터리 API 서버.
//!
//! 설정을 읽어 저장소와 실패 기록 싱크를 구성하고 Axum 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, Method, StatusCode};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use bizcard_api::auth::AUTH_TOKEN_HEADER;
use bizcard_api::metrics::setup_metrics_recorder;
use bizcard_api::observability::{DailyFileSink, ObservabilitySink, TracingSink};
use bizcard_api::openapi::swagger_ui_router;
use bizcard_api::repository::{
    CardStore, MemoryCardStore, MemoryUserStore, PgCardStore, PgUserStore, UserStore,
};
use bizcard_api::routes::create_router;
use bizcard_api::state::AppState;
use bizcard_core::{init_logging, AppConfig, AuthConfig, DatabaseConfig, LogConfig};

/// 설정이 기본 개발용 키를 그대로 쓰는지 확인합니다.
fn uses_default_secret(auth: &AuthConfig) -> bool {
    auth.jwt_secret == AuthConfig::default().jwt_secret
}

/// 데이터베이스 URL이 있으면 PostgreSQL, 없으면 인메모리 저장소를 구성합니다.
async fn create_stores(
    config: &DatabaseConfig,
) -> anyhow::Result<(Arc<dyn UserStore>, Arc<dyn CardStore>)> {
    let Some(url) = config.url.as_deref() else {
        warn!("database.url not set, using in-memory stores (data is lost on restart)");
        return Ok((
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryCardStore::new()),
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(url)
        .await?;
    info!(max_connections = config.max_connections, "Database connected");

    let users = PgUserStore::new(pool.clone());
    let cards = PgCardStore::new(pool);
    users.ensure_schema().await?;
    cards.ensure_schema().await?;

    Ok((Arc::new(users), Arc::new(cards)))
}

/// CORS 미들웨어 구성.
///
/// `CORS_ORIGINS`(쉼표 구분)가 있으면 해당 origin만 허용하고, 없으면 모두 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(AUTH_TOKEN_HEADER),
        ])
        .max_age(Duration::from_secs(3600))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from(&config.logging))?;

    info!("Starting Bizcard API server...");

    if uses_default_secret(&config.auth) {
        warn!("auth.jwt_secret not set, using default (INSECURE for development only)");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "Invalid socket address. Check server.host and server.port."
            );
            e
        })?;

    let (users, cards) = create_stores(&config.database).await?;

    let (sink, audit_writer) = if config.audit.enabled {
        info!(directory = %config.audit.directory, "Request failure log enabled");
        let (sink, writer) = DailyFileSink::spawn(&config.audit.directory);
        let sink: Arc<dyn ObservabilitySink> = Arc::new(sink);
        (sink, Some(writer))
    } else {
        let sink: Arc<dyn ObservabilitySink> = Arc::new(TracingSink);
        (sink, None)
    };

    let mut state = AppState::new(&config.auth, users, cards, sink);
    match setup_metrics_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder initialized");
            state = state.with_metrics(handle);
        }
        Err(e) => warn!(error = %e, "Failed to install metrics recorder"),
    }
    let state = Arc::new(state);

    info!(
        version = %state.version,
        backend = state.users.backend(),
        max_failed_attempts = state.auth.policy().max_attempts(),
        "Application state initialized"
    );

    let app = create_router(state)
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer());

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 라우터가 drop되어 싱크 채널이 닫히면 남은 줄을 모두 쓰고 끝남
    if let Some(writer) = audit_writer {
        if let Err(e) = writer.await {
            warn!(error = %e, "Audit log writer did not finish cleanly");
        }
    }

    info!("Server stopped gracefully");

    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기.
///
/// 핸들러 설치에 실패하면 해당 시그널은 무시하고 나머지를 기다립니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
