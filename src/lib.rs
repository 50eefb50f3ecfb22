//! Library crate for trivia-back, exposing modules for binaries and integration tests.

pub mod config;
/// Persistence layer.
pub mod dao;
/// Wire payloads.
pub mod dto;
/// Error types and HTTP mapping.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business services behind the routes.
pub mod services;
/// Game model, engine and shared state.
pub mod state;
