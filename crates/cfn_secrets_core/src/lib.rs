//! Shared custom-resource domain primitives.
//!
//! This crate owns the orchestrator wire contract, typed resource-property
//! schemas, the error taxonomy and password generation. It intentionally
//! excludes AWS SDK and Lambda runtime concerns, which live in
//! `cfn_secrets_lambda`.

pub mod contract;
pub mod error;
pub mod password;
pub mod properties;
