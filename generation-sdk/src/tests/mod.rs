//! Unit tests for the Generation SDK
//!
//! This module contains tests for the pipeline components and their wiring.

pub mod support;

pub mod config_tests;
pub mod resilience_tests;
pub mod schema_fallback_tests;
