//! HTTP server: middleware stack and listener

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes::create_router;
use crate::AppState;

/// Router with tracing and CORS for the browser frontend
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve the API on an already bound listener
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    let local = listener.local_addr()?;
    let network = state.network().await;
    tracing::info!(%local, %network, "Depeg Swap API listening");
    axum::serve(listener, create_app(state)).await
}

/// Bind `addr` and serve until the listener fails
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}
