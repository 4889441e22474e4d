//! Integration tests module
//!
//! End-to-end tests of the transync client, including:
//! - Warm-up through the server → bundle fallback chain
//! - Atomic cache replacement under concurrent readers
//! - Error handling and recovery scenarios

pub mod concurrency_test;
pub mod error_scenarios;
pub mod fallback_test;
pub mod fixtures;
