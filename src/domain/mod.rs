//! Domain layer for the contentloop engine
//!
//! This module contains core business types and the port traits that
//! infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, PublishError};
