//! HTTP API
//!
//! Axum routes over the job store, the archive directory and the reaper.

mod handlers;
mod routes;
mod server;
mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::serve;

#[cfg(test)]
mod tests;
