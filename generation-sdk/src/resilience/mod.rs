//! Resilience patterns for the generation transport
//!
//! This module provides:
//! - A retry policy with separate backoff bases for throttling and transient failures
//! - A pure backoff function so timing can be checked in isolation
//! - A retry executor with per-attempt timeouts and cancellation

mod retry;

pub use retry::{
    backoff_delay, AttemptOutcome, GenerationAttempt, RetryExecutor, RetryOutcome, RetryPolicy,
};
