use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Physical id reported for every failed Create/Update.
pub const FAILED_PHYSICAL_RESOURCE_ID: &str = "0";
/// Encrypt resources have no external identity, so they share one fixed id.
pub const ENCRYPT_PHYSICAL_RESOURCE_ID: &str = "1";
pub const SECURE_STRING_PARAMETER_TYPE: &str = "SecureString";
pub const LOG_STREAM_REASON_PREFIX: &str = "See the details in CloudWatch Log Stream: ";

pub type PropertyMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom-resource request as delivered by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: PropertyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<PropertyMap>,
}

impl LifecycleEvent {
    pub fn new(request_type: RequestType, resource_properties: PropertyMap) -> Self {
        Self {
            request_type,
            response_url: String::new(),
            stack_id: String::new(),
            request_id: String::new(),
            resource_type: String::new(),
            logical_resource_id: String::new(),
            physical_resource_id: None,
            resource_properties,
            old_resource_properties: None,
        }
    }

    pub fn with_physical_resource_id(mut self, physical_resource_id: impl Into<String>) -> Self {
        self.physical_resource_id = Some(physical_resource_id.into());
        self
    }

    /// The physical id the orchestrator already tracks, if it sent a usable one.
    pub fn existing_physical_id(&self) -> Option<&str> {
        self.physical_resource_id
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

/// The terminal outcome of one handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResult {
    pub status: ResponseStatus,
    pub data: Option<PropertyMap>,
    pub physical_resource_id: String,
    pub failure_reason: Option<String>,
}

impl HandlerResult {
    pub fn success(physical_resource_id: impl Into<String>, data: Option<PropertyMap>) -> Self {
        Self {
            status: ResponseStatus::Success,
            data,
            physical_resource_id: physical_resource_id.into(),
            failure_reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            data: None,
            physical_resource_id: FAILED_PHYSICAL_RESOURCE_ID.to_string(),
            failure_reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Callback body PUT to the event's presigned response URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PropertyMap>,
}

/// Where a callback goes and which request it answers.
///
/// Decoded leniently from the raw payload, so an event that is otherwise
/// unusable can still be answered.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackTarget {
    #[serde(rename = "ResponseURL", default)]
    pub response_url: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub logical_resource_id: String,
}

impl CallbackTarget {
    /// `None` unless the payload is an object carrying a non-blank `ResponseURL`.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let target = Self::deserialize(payload).ok()?;
        (!target.response_url.trim().is_empty()).then_some(target)
    }
}

impl From<&LifecycleEvent> for CallbackTarget {
    fn from(event: &LifecycleEvent) -> Self {
        Self {
            response_url: event.response_url.clone(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
        }
    }
}

impl CustomResourceResponse {
    pub fn new(event: &LifecycleEvent, result: &HandlerResult, log_stream: &str) -> Self {
        Self::for_target(&CallbackTarget::from(event), result, log_stream)
    }

    pub fn for_target(target: &CallbackTarget, result: &HandlerResult, log_stream: &str) -> Self {
        let log_reference = format!("{LOG_STREAM_REASON_PREFIX}{log_stream}");
        let reason = match &result.failure_reason {
            Some(message) => format!("{message}. {log_reference}"),
            None => log_reference,
        };

        Self {
            status: result.status,
            reason,
            physical_resource_id: result.physical_resource_id.clone(),
            stack_id: target.stack_id.clone(),
            request_id: target.request_id.clone(),
            logical_resource_id: target.logical_resource_id.clone(),
            no_echo: false,
            data: result.data.clone(),
        }
    }
}

/// A SecureString write against the parameter store.
#[derive(Clone, PartialEq, Eq)]
pub struct PutParameterRequest {
    pub name: String,
    pub description: Option<String>,
    pub value: String,
    pub key_id: String,
    pub overwrite: bool,
}

impl fmt::Debug for PutParameterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutParameterRequest")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("value", &"<redacted>")
            .field("key_id", &self.key_id)
            .field("overwrite", &self.overwrite)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PutConfirmation {
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// One entry of a parameter's version history, as reported back in callback data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterVersion {
    pub name: String,
    #[serde(rename = "Type")]
    pub parameter_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: String,
    pub version: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptionContext {
    pub name: String,
    pub value: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct EncryptRequest {
    pub key_id: String,
    pub plaintext: Vec<u8>,
    pub encryption_context: Option<EncryptionContext>,
}

impl fmt::Debug for EncryptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptRequest")
            .field("key_id", &self.key_id)
            .field("plaintext_len", &self.plaintext.len())
            .field("encryption_context", &self.encryption_context)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedValue {
    pub ciphertext: Vec<u8>,
    pub key_id: String,
}
