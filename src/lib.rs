// Social graph service - follow graph, feed assembly and posts behind a
// bearer-token gate

// REST surface and HTTP error rendering
pub mod api;

// Shared state wiring services to their collaborators
pub mod app_state;
pub mod config;

// Store boundary, identity verification, request context
pub mod infrastructure;

// Typed store records
pub mod models;

// Graph, feed, post and profile operations
pub mod services;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
