use std::collections::HashMap;

use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;

use crate::runtime::contract::{EncryptRequest, EncryptedValue};
use crate::runtime::error::UpstreamError;

use super::run_blocking;

pub trait KeyService {
    fn encrypt(&self, request: &EncryptRequest) -> Result<EncryptedValue, UpstreamError>;
}

impl<T: KeyService + ?Sized> KeyService for &T {
    fn encrypt(&self, request: &EncryptRequest) -> Result<EncryptedValue, UpstreamError> {
        (**self).encrypt(request)
    }
}

/// AWS KMS backed implementation.
#[derive(Debug, Clone)]
pub struct KmsKeyService {
    client: aws_sdk_kms::Client,
}

impl KmsKeyService {
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

impl KeyService for KmsKeyService {
    fn encrypt(&self, request: &EncryptRequest) -> Result<EncryptedValue, UpstreamError> {
        let client = self.client.clone();
        let key_id = request.key_id.clone();
        let plaintext = Blob::new(request.plaintext.clone());
        let encryption_context = request
            .encryption_context
            .as_ref()
            .map(|context| HashMap::from([(context.name.clone(), context.value.clone())]));

        let output = run_blocking(async move {
            client
                .encrypt()
                .key_id(key_id)
                .plaintext(plaintext)
                .set_encryption_context(encryption_context)
                .send()
                .await
        })
        .map_err(|error| UpstreamError::Service(DisplayErrorContext(&error).to_string()))?;

        let ciphertext = output
            .ciphertext_blob()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| UpstreamError::Service("kms returned no ciphertext".to_string()))?;

        Ok(EncryptedValue {
            ciphertext,
            key_id: output.key_id().unwrap_or(&request.key_id).to_string(),
        })
    }
}
