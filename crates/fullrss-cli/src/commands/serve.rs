use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{info, warn};

use fullrss_core::{AppConfig, Error, FullFeedService};

pub async fn run(
    mut config: AppConfig,
    addr: Option<String>,
    port: Option<u16>,
    workers: Option<usize>,
) -> Result<()> {
    if let Some(addr) = addr {
        config.server.bind = addr;
    }
    if let Some(port) = port {
        config.server.port = port;
    } else if let Ok(port) = std::env::var("PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("Invalid PORT value: {}", port))?;
    }
    if let Some(workers) = workers {
        config.fetch.workers = workers;
    }
    config.validate()?;

    let service = Arc::new(FullFeedService::new(&config)?);
    let app = router(service);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        "Serving full-text feeds on http://{} ({} workers per feed)",
        addr, config.fetch.workers
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn router(service: Arc<FullFeedService>) -> Router {
    Router::new()
        .route("/feed/*source", get(full_feed))
        .route("/version", get(version))
        .with_state(service)
}

async fn full_feed(
    State(service): State<Arc<FullFeedService>>,
    Path(source): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let source = source_url(&source, query.as_deref());
    match service.render_rss(&source).await {
        Ok(rss) => ([(header::CONTENT_TYPE, "application/xml")], rss).into_response(),
        Err(e) => {
            warn!("Failed to serve {}: {}", source, e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// The query string belongs to the source feed, not to this route
fn source_url(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::InvalidSource(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
