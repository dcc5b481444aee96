//! parley HTTP server.
//!
//! Wires configuration, storage, tools, and the model gateway into the chat
//! flow and serves it over JSON endpoints.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
