mod config;

use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use config::ServerConfig;
use webforge_runtime::RuntimeContext;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("webforge=info")))
        .init();

    let loaded = webforge_runtime::site_load::load_site(&config.site_path);
    if !loaded.errors.is_empty() {
        tracing::warn!(count = loaded.errors.len(), "site loaded with parse errors");
    }

    let pool = webforge_runtime::site_load::open_pool(loaded.database_url.as_deref(), config.pool_initial, config.pool_max)
        .await
        .expect("failed to open database connection pool");

    let addr: SocketAddr = config
        .addr_override
        .clone()
        .unwrap_or_else(|| format!("127.0.0.1:{}", loaded.port))
        .parse()
        .expect("WEBFORGE_ADDR must be a valid socket address");

    let rt = RuntimeContext::new(loaded.site, pool);

    let app = Router::new()
        .fallback(webforge_runtime::dispatch::dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(rt);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind listen address");
    tracing::info!(%addr, "webforge server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining in-flight requests");
}
