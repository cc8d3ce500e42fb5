//! Neuromem HTTP Server
//!
//! Exposes a [`neuromem::NeuralMemory`] keyed by integers over a small JSON
//! API.
//!
//! ## Routes
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | POST | `/reduction/save` | Queue a store, `202 { task_id }` |
//! | GET | `/reduction/get?key_from=&key_to_exclude=` | Values in insertion order |
//! | GET | `/reduction/nearby?center=` | Closer adjacent entry |
//! | GET | `/reduction/range?from=&to=` | Nearest neighbor of each position |
//! | GET | `/health` | Liveness |
//! | GET | `/stats` | Cache and queue statistics |
//!
//! ## Usage
//!
//! ```bash
//! # Start with default settings (port 12000)
//! neuromem-server
//!
//! # Custom port and config file
//! neuromem-server --port 8080 --config neuromem.toml
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod tensor;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use routes::{router, AppState};
pub use tensor::NetTensor;

use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    memory: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }

    axum::serve(listener, router(memory))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
