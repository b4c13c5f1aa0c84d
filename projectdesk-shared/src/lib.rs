//! # ProjectDesk Shared Library
//!
//! Types, store access and security primitives shared by the ProjectDesk
//! API server and its tests.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, JWT tokens, request authentication and the
//!   access policy
//! - `db`: SQLite pool, embedded migrations and bootstrap data
//! - `models`: database models and their CRUD operations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the ProjectDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
