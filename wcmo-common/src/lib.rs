//! # WCMO Common Library
//!
//! Shared code for the WCMO (Wood-Carving Media Organizer) tools:
//! - Error types
//! - Configuration loading and library root resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
