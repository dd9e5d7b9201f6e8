//! Process start-up shared by every Lambda binary.

use aws_config::{BehaviorVersion, SdkConfig};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::adapters::response::{HttpResponseSignaler, ResponseSignaler};
use crate::config::{RuntimeConfig, DEFAULT_LOG_FILTER};
use crate::handlers::{handle_lifecycle_event, ResourceHandler};
use crate::runtime::contract::{
    CallbackTarget, CustomResourceResponse, HandlerResult, LifecycleEvent,
};
use crate::runtime::error::HandlerError;

/// Installs the process-wide JSON logger. Later calls are no-ops.
pub fn init_logging(config: &RuntimeConfig) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .with_current_span(false)
        .try_init();
}

/// Reads configuration, builds the handler once, then serves invocations until
/// the runtime shuts the process down.
pub async fn serve<H, F>(build_handler: F) -> Result<(), Error>
where
    H: ResourceHandler,
    F: FnOnce(&SdkConfig) -> H,
{
    let config = RuntimeConfig::from_env()?;
    init_logging(&config);

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let handler = build_handler(&sdk_config);
    let signaler = HttpResponseSignaler::new(config.response_timeout)?;

    let handler = &handler;
    let signaler = &signaler;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_invocation(event, handler, signaler)
    }))
    .await
}

/// Decodes one orchestrator event and drives it to its single callback.
pub fn handle_invocation(
    event: LambdaEvent<Value>,
    handler: &impl ResourceHandler,
    signaler: &impl ResponseSignaler,
) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();

    let lifecycle_event = match LifecycleEvent::deserialize(&payload) {
        Ok(event) => event,
        Err(error) => {
            let failure = HandlerError::validation(format!("invalid lifecycle event: {error}"));
            error!(
                resource_type = handler.resource_type(),
                error_kind = failure.kind(),
                "{failure}"
            );
            reject_undecodable(&payload, &failure, signaler, &context.env_config.log_stream);
            return Err(Error::from(failure.to_string()));
        }
    };

    let result = handle_lifecycle_event(
        handler,
        &lifecycle_event,
        signaler,
        &context.env_config.log_stream,
    )
    .map_err(|failure| Error::from(failure.to_string()))?;

    Ok(json!({
        "Status": result.status.as_str(),
        "PhysicalResourceId": result.physical_resource_id,
    }))
}

/// Best-effort FAILED callback for an event that could not be decoded, so the
/// orchestrator does not wait for its timeout when a `ResponseURL` is present.
fn reject_undecodable(
    payload: &Value,
    failure: &HandlerError,
    signaler: &impl ResponseSignaler,
    log_stream: &str,
) {
    let Some(target) = CallbackTarget::from_payload(payload) else {
        return;
    };

    let result = HandlerResult::failed(failure.to_string());
    let response = CustomResourceResponse::for_target(&target, &result, log_stream);
    if let Err(message) = signaler.send(&target.response_url, &response) {
        error!(
            logical_resource_id = %target.logical_resource_id,
            error_kind = "protocol_error",
            "failed to send custom resource response: {message}"
        );
    }
}

#[cfg(test)]
mod tests {
    use lambda_runtime::Context;

    use super::*;
    use crate::handlers::ssm_value::SsmValueHandler;
    use crate::test_helpers::{CapturingSignaler, InMemoryParameterStore};

    #[test]
    fn invocation_sends_one_callback_and_echoes_status() {
        let store = InMemoryParameterStore::new();
        store.seed("/app/config", "value");
        let signaler = CapturingSignaler::new();
        let payload = json!({
            "RequestType": "Create",
            "ResponseURL": "https://example.test/presigned",
            "StackId": "stack",
            "RequestId": "req",
            "ResourceType": "Custom::GetSsmValue",
            "LogicalResourceId": "Config",
            "ResourceProperties": {"Name": "/app/config"}
        });

        let output = handle_invocation(
            LambdaEvent::new(payload, Context::default()),
            &SsmValueHandler::new(&store),
            &signaler,
        )
        .expect("invocation should succeed");

        assert_eq!(output["Status"], Value::from("SUCCESS"));
        assert_eq!(output["PhysicalResourceId"], Value::from("/app/config1"));
        assert_eq!(signaler.single_response().logical_resource_id, "Config");
    }

    #[test]
    fn undecodable_event_is_an_invocation_error() {
        let store = InMemoryParameterStore::new();
        let signaler = CapturingSignaler::new();

        let error = handle_invocation(
            LambdaEvent::new(json!({"RequestType": "Rotate"}), Context::default()),
            &SsmValueHandler::new(&store),
            &signaler,
        )
        .expect_err("unknown request type should fail");

        assert!(error.to_string().contains("invalid lifecycle event"));
        assert_eq!(signaler.attempts(), 0);
    }

    #[test]
    fn undecodable_event_with_response_url_is_answered_as_failed() {
        let store = InMemoryParameterStore::new();
        let signaler = CapturingSignaler::new();
        let payload = json!({
            "RequestType": "Rotate",
            "ResponseURL": "https://example.test/presigned",
            "StackId": "stack",
            "RequestId": "req",
            "LogicalResourceId": "Config"
        });

        let error = handle_invocation(
            LambdaEvent::new(payload, Context::default()),
            &SsmValueHandler::new(&store),
            &signaler,
        )
        .expect_err("unknown request type should fail");

        assert!(error.to_string().contains("invalid lifecycle event"));
        let response = signaler.single_response();
        assert_eq!(response.status.as_str(), "FAILED");
        assert_eq!(response.physical_resource_id, "0");
        assert_eq!(response.request_id, "req");
        assert_eq!(response.logical_resource_id, "Config");
        assert!(response.reason.starts_with("invalid lifecycle event"));
        assert_eq!(store.network_calls(), 0);
    }

    #[test]
    fn undeliverable_callback_is_an_invocation_error() {
        let store = InMemoryParameterStore::new();
        let signaler = CapturingSignaler::failing("403 Forbidden");

        let error = handle_invocation(
            LambdaEvent::new(
                json!({"RequestType": "Delete", "PhysicalResourceId": "/app/config1"}),
                Context::default(),
            ),
            &SsmValueHandler::new(&store),
            &signaler,
        )
        .expect_err("delivery failure should surface");

        assert!(error.to_string().contains("403 Forbidden"));
    }
}
