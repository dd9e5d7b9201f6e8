//! Domain primitives re-exported from `cfn_secrets_core`.

pub use cfn_secrets_core::{contract, error, password, properties};
