//! # Recipe API Server Library
//!
//! Router, configuration and handlers for the recipe API. The binary in
//! `main.rs` wires these to a database pool and a listener; integration
//! tests drive the router directly.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
