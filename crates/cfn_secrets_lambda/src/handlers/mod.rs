//! Lifecycle driver shared by every custom-resource handler.
//!
//! A handler only describes its side effect for Create/Update
//! ([`ResourceHandler::provision`]) and Delete ([`ResourceHandler::teardown`]).
//! [`handle_lifecycle_event`] owns the rest: dispatching on the request type,
//! mapping failures onto the callback contract, and sending exactly one callback.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::adapters::response::ResponseSignaler;
use crate::runtime::contract::{
    CustomResourceResponse, HandlerResult, LifecycleEvent, PropertyMap, RequestType,
    FAILED_PHYSICAL_RESOURCE_ID,
};
use crate::runtime::error::HandlerError;

pub mod encrypt;
pub mod secure_parameter;
pub mod ssm_value;

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutput {
    pub physical_resource_id: String,
    pub data: Option<PropertyMap>,
}

impl HandlerOutput {
    pub fn new(physical_resource_id: impl Into<String>, data: Option<PropertyMap>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            data,
        }
    }

    /// Keeps the identity the orchestrator already holds.
    pub fn unchanged(event: &LifecycleEvent) -> Self {
        Self::new(
            event
                .existing_physical_id()
                .unwrap_or(FAILED_PHYSICAL_RESOURCE_ID),
            None,
        )
    }
}

pub trait ResourceHandler {
    fn resource_type(&self) -> &'static str;

    /// Performs the Create/Update side effect.
    fn provision(&self, event: &LifecycleEvent) -> Result<HandlerOutput, HandlerError>;

    /// Performs the Delete side effect. Side-effect-free resources keep the default.
    fn teardown(&self, event: &LifecycleEvent) -> Result<HandlerOutput, HandlerError> {
        Ok(HandlerOutput::unchanged(event))
    }
}

impl<T: ResourceHandler + ?Sized> ResourceHandler for &T {
    fn resource_type(&self) -> &'static str {
        (**self).resource_type()
    }

    fn provision(&self, event: &LifecycleEvent) -> Result<HandlerOutput, HandlerError> {
        (**self).provision(event)
    }

    fn teardown(&self, event: &LifecycleEvent) -> Result<HandlerOutput, HandlerError> {
        (**self).teardown(event)
    }
}

/// Runs the handler and folds any failure into the callback outcome.
///
/// Create/Update failures become `FAILED` with physical id `"0"`. Delete
/// failures are logged and still reported as `SUCCESS` under the physical id
/// the orchestrator sent, so teardown never gets stuck.
pub fn resolve_outcome(handler: &impl ResourceHandler, event: &LifecycleEvent) -> HandlerResult {
    let resource_type = handler.resource_type();
    let request_type = event.request_type;

    match request_type {
        RequestType::Create | RequestType::Update => match handler.provision(event) {
            Ok(output) => {
                info!(
                    resource_type,
                    request_type = request_type.as_str(),
                    logical_resource_id = %event.logical_resource_id,
                    physical_resource_id = %output.physical_resource_id,
                    "custom resource provisioned"
                );
                HandlerResult::success(output.physical_resource_id, output.data)
            }
            Err(failure) => {
                error!(
                    resource_type,
                    request_type = request_type.as_str(),
                    logical_resource_id = %event.logical_resource_id,
                    error_kind = failure.kind(),
                    error = ?failure,
                    "failed to {} custom resource: {failure}",
                    request_type.as_str().to_lowercase()
                );
                HandlerResult::failed(failure.to_string())
            }
        },
        RequestType::Delete => match handler.teardown(event) {
            Ok(output) => {
                info!(
                    resource_type,
                    request_type = request_type.as_str(),
                    logical_resource_id = %event.logical_resource_id,
                    physical_resource_id = %output.physical_resource_id,
                    "custom resource deleted"
                );
                HandlerResult::success(output.physical_resource_id, output.data)
            }
            Err(failure) => {
                let output = HandlerOutput::unchanged(event);
                warn!(
                    resource_type,
                    request_type = request_type.as_str(),
                    logical_resource_id = %event.logical_resource_id,
                    physical_resource_id = %output.physical_resource_id,
                    error_kind = failure.kind(),
                    error = ?failure,
                    "delete failed, reporting success so teardown can continue: {failure}"
                );
                HandlerResult::success(output.physical_resource_id, None)
            }
        },
    }
}

/// Resolves the outcome and sends it, returning `Protocol` if delivery fails.
pub fn handle_lifecycle_event(
    handler: &impl ResourceHandler,
    event: &LifecycleEvent,
    signaler: &impl ResponseSignaler,
    log_stream: &str,
) -> Result<HandlerResult, HandlerError> {
    let result = resolve_outcome(handler, event);
    let response = CustomResourceResponse::new(event, &result, log_stream);

    if let Err(message) = signaler.send(&event.response_url, &response) {
        let failure = HandlerError::Protocol(message);
        error!(
            resource_type = handler.resource_type(),
            request_type = event.request_type.as_str(),
            logical_resource_id = %event.logical_resource_id,
            error_kind = failure.kind(),
            "{failure}"
        );
        return Err(failure);
    }

    Ok(result)
}

/// Serializes a typed payload into callback `Data`.
pub(crate) fn response_data(payload: &impl Serialize) -> Result<PropertyMap, HandlerError> {
    match serde_json::to_value(payload) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(HandlerError::Protocol(format!(
            "response data must be an object, got {other}"
        ))),
        Err(error) => Err(HandlerError::Protocol(format!(
            "response data could not be serialized: {error}"
        ))),
    }
}
