//! Manifold Core - Fundamental types for the broadcast stream primitive
//!
//! This crate defines the types shared by the Manifold source and its
//! subscribers:
//! - Terminal state (one-shot completed/faulted cell)
//! - Fault values replayed to consumers
//! - The tagged outcome of a consumer pull
//! - Source configuration

pub mod config;
pub mod error;
pub mod pull;
pub mod terminal;

pub use config::*;
pub use error::*;
pub use pull::*;
pub use terminal::*;
