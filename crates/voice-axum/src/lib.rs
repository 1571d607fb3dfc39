//! Axum web adapter: WebSocket media-stream handlers, TwiML endpoint, and
//! the composition glue that turns externally-built ports into a running
//! HTTP server.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use bootstrap::{bootstrap, start_server, AxumDeps, CorsConfig, ServerConfig};
pub use error::HttpError;
pub use routes::create_router;
pub use state::{AppState, AxumContext, SttFactory};
