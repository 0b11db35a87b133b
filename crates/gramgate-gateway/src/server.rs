// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and the serve loop.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use gramgate_connect::ConnectionManager;
use gramgate_core::GramgateError;
use gramgate_storage::SqliteStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth;
use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub store: SqliteStore,
    pub manager: ConnectionManager,
    pub token_ttl_hours: i64,
    pub dialogs_page_limit: usize,
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/v1/accounts",
            post(handlers::create_account).get(handlers::list_accounts),
        )
        .route(
            "/v1/accounts/{id}",
            get(handlers::get_account)
                .patch(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route("/v1/accounts/{id}/connect", post(handlers::connect))
        .route("/v1/accounts/{id}/verify-code", post(handlers::verify_code))
        .route(
            "/v1/accounts/{id}/verify-password",
            post(handlers::verify_password),
        )
        .route("/v1/accounts/{id}/disconnect", post(handlers::disconnect))
        .route("/v1/accounts/{id}/logout", post(handlers::logout))
        .route("/v1/accounts/{id}/dialogs", get(handlers::dialogs))
        .route("/v1/accounts/{id}/folders", get(handlers::folders))
        .route("/v1/accounts/{id}/overview", get(handlers::overview))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/login", post(auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), GramgateError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GramgateError::Config(format!("cannot bind {addr}: {e}")))?;
    info!(%addr, "gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| GramgateError::Internal(format!("server error: {e}")))
}
