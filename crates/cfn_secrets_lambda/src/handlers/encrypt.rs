use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tracing::info;

use crate::adapters::key_service::KeyService;
use crate::runtime::contract::{EncryptRequest, LifecycleEvent, ENCRYPT_PHYSICAL_RESOURCE_ID};
use crate::runtime::error::HandlerError;
use crate::runtime::properties::EncryptProperties;

use super::{response_data, HandlerOutput, ResourceHandler};

pub const ENCRYPT_RESOURCE_TYPE: &str = "Custom::Encrypt";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptResponseData {
    pub ciphertext_base64: String,
    pub key_id: String,
}

/// Encrypts `Base64Data` under a KMS key. The result is a pure function of the
/// inputs, so every resource shares the fixed physical id `"1"` and Delete has
/// nothing to undo.
#[derive(Debug, Clone)]
pub struct EncryptHandler<K> {
    key_service: K,
}

impl<K: KeyService> EncryptHandler<K> {
    pub fn new(key_service: K) -> Self {
        Self { key_service }
    }
}

impl<K: KeyService> ResourceHandler for EncryptHandler<K> {
    fn resource_type(&self) -> &'static str {
        ENCRYPT_RESOURCE_TYPE
    }

    fn provision(&self, event: &LifecycleEvent) -> Result<HandlerOutput, HandlerError> {
        let properties = EncryptProperties::from_properties(&event.resource_properties)?;
        let plaintext = STANDARD
            .decode(properties.base64_data.trim())
            .map_err(|error| {
                HandlerError::validation(format!("Base64Data is not valid base64: {error}"))
            })?;

        let encrypted = self
            .key_service
            .encrypt(&EncryptRequest {
                key_id: properties.key_id,
                plaintext,
                encryption_context: properties.encryption_context,
            })
            .map_err(|error| HandlerError::upstream("kms:Encrypt", error))?;

        info!(key_id = %encrypted.key_id, "successfully encrypted value");

        let data = response_data(&EncryptResponseData {
            ciphertext_base64: STANDARD.encode(&encrypted.ciphertext),
            key_id: encrypted.key_id,
        })?;
        Ok(HandlerOutput::new(ENCRYPT_PHYSICAL_RESOURCE_ID, Some(data)))
    }
}
