//! HTTP server for the Document Anchor Ledger.
//!
//! Accepts documents over HTTP, runs them through the ingestion pipeline,
//! and reports per-subject submission state. The ledger session is
//! established in the background and retried until it succeeds.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use bootstrap::SessionConnector;
pub use config::{NodeConfig, ServerConfig};
pub use error::{ApiError, ErrorBody, ServerError, ServerResult};
pub use handler::{HealthResponse, StatusResponse, SubmitResponse};
pub use router::{build_router, AppState};
pub use server::DalServer;
