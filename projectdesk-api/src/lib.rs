//! # ProjectDesk API Server Library
//!
//! Core of the ProjectDesk HTTP server, split out of the binary so
//! integration tests can build the same router.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with JSON error bodies
//! - `middleware`: Authentication, rate limiting and security headers
//! - `routes`: API route handlers
//! - `validation`: Field validators shared by request types

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod validation;
