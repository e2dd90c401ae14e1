//! Shared test utilities for faxqueue integration tests.
//!
//! This module provides:
//! - `TestHarness` for an isolated spool with stage directories and buckets
//! - Builders for worker-written outcome records

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
