//! Common utilities for ouroboros
//!
//! This crate provides shared functionality used across all ouroboros modules.

pub mod error;

pub use error::{DataBridgeError, Result};
