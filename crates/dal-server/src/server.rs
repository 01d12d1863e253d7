use std::sync::Arc;

use dal_ledger::InMemoryLedger;
use dal_pipeline::IngestionPipeline;
use dal_store::open_store;
use tokio::net::TcpListener;

use crate::bootstrap::SessionConnector;
use crate::config::NodeConfig;
use crate::error::ServerResult;
use crate::router::{build_router, AppState};

/// DAL node: content store, development ledger, and the HTTP API in front
/// of the ingestion pipeline.
pub struct DalServer {
    config: NodeConfig,
    pipeline: Arc<IngestionPipeline>,
    ledger: Arc<InMemoryLedger>,
    connector: SessionConnector,
}

impl DalServer {
    /// Open the store and ledger described by `config`. The ledger session
    /// is not established until [`DalServer::serve`] runs.
    pub fn new(config: NodeConfig) -> ServerResult<Self> {
        let store = open_store(&config.store)?;
        let ledger = Arc::new(config.ledger.development_ledger()?);
        let signers = Arc::new(config.ledger.signer_provider()?);
        let pipeline = Arc::new(IngestionPipeline::new(store, config.pipeline.clone()));
        let connector = SessionConnector::new(
            ledger.clone(),
            signers,
            config.ledger.clone(),
            Arc::clone(&pipeline),
        );
        Ok(Self {
            config,
            pipeline,
            ledger,
            connector,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<IngestionPipeline> {
        &self.pipeline
    }

    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    pub fn connector(&self) -> &SessionConnector {
        &self.connector
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(
            Arc::clone(&self.pipeline),
            self.config.server.max_body_bytes,
        ))
    }

    /// Start serving requests. The ledger session is established in the
    /// background; until then submissions are refused.
    pub async fn serve(self) -> ServerResult<()> {
        let session_task = self.connector.clone().spawn();
        let app = self.router();
        let listener = TcpListener::bind(self.config.server.bind_addr).await?;
        tracing::info!(
            addr = %self.config.server.bind_addr,
            store = self.pipeline.store().backend_name(),
            network = %self.ledger.network(),
            "DAL server listening"
        );
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        session_task.abort();
        Ok(served?)
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use dal_store::StoreBackend;

    #[test]
    fn server_construction() {
        let server = DalServer::new(NodeConfig::default()).unwrap();
        assert_eq!(server.config().server.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(server.pipeline().store().backend_name(), "memory");
        assert!(!server.pipeline().has_session());
        let _router = server.router();
    }

    #[test]
    fn bad_signer_seed_fails_construction() {
        let mut config = NodeConfig::default();
        config.ledger.signer_seed_hex = Some("not hex".into());
        assert!(matches!(DalServer::new(config), Err(ServerError::Ledger(_))));
    }

    #[test]
    fn bad_store_endpoint_fails_construction() {
        let mut config = NodeConfig::default();
        config.store.backend = StoreBackend::Http;
        config.store.protocol = "ftp".into();
        assert!(matches!(DalServer::new(config), Err(ServerError::Store(_))));
    }

    #[tokio::test]
    async fn connector_installs_session() {
        let server = DalServer::new(NodeConfig::default()).unwrap();
        let session = server.connector().connect_once().await.unwrap();
        assert!(server.pipeline().has_session());
        assert_eq!(session.network(), server.ledger().network());
    }
}
