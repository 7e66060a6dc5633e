//! Shared utilities, configuration, and error handling for Cartoonist
//!
//! This crate provides common functionality used across the Cartoonist services:
//! - Configuration management following 12-factor principles
//! - The error taxonomy and its HTTP mapping
//! - Request extractors (validated JSON and query strings, pagination)

pub mod config;
pub mod error;
pub mod extractors;

pub use config::Config;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson, ValidatedQuery};
