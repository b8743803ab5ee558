//! Service-specific client implementations
//!
//! This module contains the client for the remote generation provider.

pub mod provider;
mod common;

pub use common::UserAgent;
