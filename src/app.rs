use std::{net::SocketAddr, time::Duration};

use axum::{
    body::Body,
    http::{Request, Response},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

use crate::auth::middleware::require_auth;
use crate::envelope::Envelope;
use crate::state::AppState;
use crate::{auth, categories, tasks};

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(tasks::router())
        .merge(categories::router())
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::public_router())
                .route("/health", get(|| async { Envelope::message("OK") }))
                .merge(protected),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(log_response),
        )
}

fn request_span(req: &Request<Body>) -> Span {
    let method = req.method().clone();
    let uri = req.uri().clone();
    tracing::info_span!(
        "http_request",
        %method,
        uri = %uri,
        status = tracing::field::Empty
    )
}

fn log_response(res: &Response<Body>, _latency: Duration, span: &Span) {
    let status = res.status();
    span.record("status", tracing::field::display(status));
    if status.is_server_error() {
        tracing::error!(%status, "response");
    } else {
        tracing::info!(%status, "response");
    }
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let port = std::env::var("APP_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "8080".into());
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        port
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
