// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service wiring: storage, client factory, connection manager, and
//! the HTTP gateway, with an orderly shutdown sweep.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gramgate_config::GramgateConfig;
use gramgate_connect::ConnectionManager;
use gramgate_core::{AccountRegistry, ClientFactory, GramgateError};
use gramgate_gateway::AppState;
use gramgate_mtproto::AdapterFactory;
use gramgate_storage::SqliteStore;
use tracing::{info, warn};

pub async fn run(config: GramgateConfig) -> Result<(), GramgateError> {
    let store = SqliteStore::open(&config.storage.database_path).await?;
    info!(path = %config.storage.database_path, "storage ready");

    match store.purge_expired_tokens().await {
        Ok(0) => {}
        Ok(n) => info!(count = n, "purged expired tokens"),
        Err(e) => warn!(error = %e, "token purge failed"),
    }

    let registry: Arc<dyn AccountRegistry> = Arc::new(store.clone());
    let factory: Arc<dyn ClientFactory> = Arc::new(AdapterFactory::new(
        backend_factory(),
        Duration::from_secs(config.telegram.request_timeout_secs),
        config.telegram.reconnect_budget,
    ));
    let manager = ConnectionManager::new(
        registry,
        factory,
        Duration::from_secs(config.telegram.code_ttl_secs),
    );

    let state = AppState {
        store: store.clone(),
        manager: manager.clone(),
        token_ttl_hours: config.auth.token_ttl_hours as i64,
        dialogs_page_limit: config.telegram.dialogs_page_limit,
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| GramgateError::Config(format!("invalid bind address: {e}")))?;

    gramgate_gateway::serve(addr, state, shutdown_signal()).await?;

    // Sweep live clients before the store goes away so statuses land
    // in the database.
    manager.disconnect_all().await;
    store.close().await?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(feature = "mtproto")]
fn backend_factory() -> Box<dyn ClientFactory> {
    Box::new(gramgate_mtproto::GrammersFactory)
}

/// Built without an MTProto backend: account CRUD and auth still work,
/// but connect attempts report the missing backend.
#[cfg(not(feature = "mtproto"))]
fn backend_factory() -> Box<dyn ClientFactory> {
    struct Unconfigured;

    #[async_trait::async_trait]
    impl ClientFactory for Unconfigured {
        async fn create(
            &self,
            _api_id: i32,
            _api_hash: &str,
            _session: Option<&gramgate_core::SessionBlob>,
        ) -> Result<Box<dyn gramgate_core::RawClient>, GramgateError> {
            Err(GramgateError::Config(
                "no MTProto backend compiled in; rebuild with --features mtproto".into(),
            ))
        }
    }

    Box::new(Unconfigured)
}
