//! # API Shared
//!
//! Shared definitions for the Wardboard surfaces.
//!
//! Contains:
//! - Health check response and `HealthService`
//! - API key validation usable by any transport
//!
//! Used by `api-rest` and the `wardboard-run` binary.

pub mod auth;
pub mod health;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER};
pub use health::{HealthRes, HealthService};
