#![allow(dead_code)]

use cfn_secrets_lambda::handlers::secure_parameter::{SecureParameterHandler, ValueMode};
use cfn_secrets_lambda::runtime::contract::{LifecycleEvent, RequestType};
use cfn_secrets_lambda::runtime::password::PasswordGenerator;
use cfn_secrets_lambda::test_helpers::{event_with, InMemoryParameterStore};
use serde_json::{json, Value};

/// Handler over a borrowed in-memory store with a deterministic generator.
pub fn parameter_handler(
    store: &InMemoryParameterStore,
    mode: ValueMode,
) -> SecureParameterHandler<&InMemoryParameterStore> {
    SecureParameterHandler::with_generator(store, mode, PasswordGenerator::seeded(2026))
}

/// Properties of the generated database password used across scenarios.
pub fn db_password_properties() -> Value {
    json!({
        "ServiceToken": "arn:aws:lambda:eu-west-1:123456789012:function:secure-parameter",
        "Name": "/app/db/pass",
        "Description": "d",
        "KeyId": "alias/x",
        "GeneratePassword": "true",
        "GeneratePasswordLength": "16"
    })
}

pub fn db_password_event(request_type: RequestType) -> LifecycleEvent {
    event_with(request_type, db_password_properties())
}
