//! AWS-oriented adapters and handlers for the secret custom resources.
//!
//! This crate owns runtime integration details (Lambda entry points, SSM and
//! KMS clients, callback delivery) and exposes a single runtime module
//! boundary for the contract, property and password primitives.

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod runtime;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
