//! f1desk API crate - axum HTTP surface for the Q&A store, notifications,
//! question analytics and the chat pipeline.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::{AppState, Stores};
