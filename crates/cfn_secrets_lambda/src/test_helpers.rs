//! In-memory collaborators for handler tests.
//!
//! These fakes record every call behind a `Mutex` so tests can assert on the
//! side effects a handler performed (or did not perform).

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::adapters::key_service::KeyService;
use crate::adapters::parameter_store::ParameterStore;
use crate::adapters::response::ResponseSignaler;
use crate::runtime::contract::{
    CustomResourceResponse, EncryptRequest, EncryptedValue, LifecycleEvent, ParameterVersion,
    PropertyMap, PutConfirmation, PutParameterRequest, RequestType, SECURE_STRING_PARAMETER_TYPE,
};
use crate::runtime::error::UpstreamError;

pub const TEST_RESPONSE_URL: &str = "https://cloudformation-custom-resource-response.test/presigned";
pub const TEST_MODIFIED_DATE: &str = "2026-01-01T00:00:00Z";

/// Builds an event with the usual orchestrator fields filled in.
///
/// # Panics
///
/// Panics if `properties` is not a JSON object.
pub fn event_with(request_type: RequestType, properties: Value) -> LifecycleEvent {
    let Value::Object(properties) = properties else {
        panic!("resource properties must be a JSON object");
    };
    let mut event = LifecycleEvent::new(request_type, properties);
    event.response_url = TEST_RESPONSE_URL.to_string();
    event.stack_id = "arn:aws:cloudformation:eu-west-1:123456789012:stack/test/guid".to_string();
    event.request_id = "test-request".to_string();
    event.logical_resource_id = "TestResource".to_string();
    event
}

#[derive(Debug, Default)]
struct StoreFailures {
    exists: Option<UpstreamError>,
    put: Option<UpstreamError>,
    delete: Option<UpstreamError>,
    history: Option<UpstreamError>,
}

/// Parameter store keeping a version history per name.
#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    parameters: Mutex<BTreeMap<String, Vec<ParameterVersion>>>,
    hidden_from_describe: Mutex<Vec<String>>,
    writes: Mutex<Vec<PutParameterRequest>>,
    deletes: Mutex<Vec<String>>,
    network_calls: Mutex<usize>,
    failures: Mutex<StoreFailures>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a version directly, bypassing the recorded writes.
    pub fn seed(&self, name: &str, value: &str) {
        let mut parameters = self.parameters.lock().expect("poisoned mutex");
        let history = parameters.entry(name.to_string()).or_default();
        let version = history.last().map_or(1, |entry| entry.version + 1);
        history.push(ParameterVersion {
            name: name.to_string(),
            parameter_type: SECURE_STRING_PARAMETER_TYPE.to_string(),
            key_id: Some("alias/seeded".to_string()),
            last_modified_date: Some(TEST_MODIFIED_DATE.to_string()),
            last_modified_user: Some("arn:aws:iam::123456789012:user/seed".to_string()),
            description: None,
            value: value.to_string(),
            version,
            labels: Vec::new(),
            tier: Some("Standard".to_string()),
        });
    }

    /// Seeds a parameter that the existence check will not see, as if it
    /// appeared between the check and the write.
    pub fn seed_hidden(&self, name: &str, value: &str) {
        self.seed(name, value);
        self.hidden_from_describe
            .lock()
            .expect("poisoned mutex")
            .push(name.to_string());
    }

    pub fn fail_exists_with(&self, error: UpstreamError) {
        self.failures.lock().expect("poisoned mutex").exists = Some(error);
    }

    pub fn fail_puts_with(&self, error: UpstreamError) {
        self.failures.lock().expect("poisoned mutex").put = Some(error);
    }

    pub fn fail_deletes_with(&self, error: UpstreamError) {
        self.failures.lock().expect("poisoned mutex").delete = Some(error);
    }

    pub fn fail_history_with(&self, error: UpstreamError) {
        self.failures.lock().expect("poisoned mutex").history = Some(error);
    }

    pub fn writes(&self) -> Vec<PutParameterRequest> {
        self.writes.lock().expect("poisoned mutex").clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().expect("poisoned mutex").clone()
    }

    /// Number of store calls of any kind, successful or not.
    pub fn network_calls(&self) -> usize {
        *self.network_calls.lock().expect("poisoned mutex")
    }

    pub fn current_value(&self, name: &str) -> Option<String> {
        self.parameters
            .lock()
            .expect("poisoned mutex")
            .get(name)
            .and_then(|history| history.last())
            .map(|entry| entry.value.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters
            .lock()
            .expect("poisoned mutex")
            .contains_key(name)
    }

    fn record_call(&self) {
        *self.network_calls.lock().expect("poisoned mutex") += 1;
    }
}

impl ParameterStore for InMemoryParameterStore {
    fn parameter_exists(&self, name: &str) -> Result<bool, UpstreamError> {
        self.record_call();
        if let Some(error) = self.failures.lock().expect("poisoned mutex").exists.clone() {
            return Err(error);
        }
        let hidden = self
            .hidden_from_describe
            .lock()
            .expect("poisoned mutex")
            .iter()
            .any(|entry| entry == name);
        Ok(!hidden && self.contains(name))
    }

    fn put_parameter(
        &self,
        request: &PutParameterRequest,
    ) -> Result<PutConfirmation, UpstreamError> {
        self.record_call();
        if let Some(error) = self.failures.lock().expect("poisoned mutex").put.clone() {
            return Err(error);
        }

        let mut parameters = self.parameters.lock().expect("poisoned mutex");
        if parameters.contains_key(&request.name) && !request.overwrite {
            return Err(UpstreamError::AlreadyExists);
        }

        self.writes
            .lock()
            .expect("poisoned mutex")
            .push(request.clone());

        let history = parameters.entry(request.name.clone()).or_default();
        let version = history.last().map_or(1, |entry| entry.version + 1);
        history.push(ParameterVersion {
            name: request.name.clone(),
            parameter_type: SECURE_STRING_PARAMETER_TYPE.to_string(),
            key_id: Some(request.key_id.clone()),
            last_modified_date: Some(TEST_MODIFIED_DATE.to_string()),
            last_modified_user: Some("arn:aws:iam::123456789012:role/handler".to_string()),
            description: request.description.clone(),
            value: request.value.clone(),
            version,
            labels: Vec::new(),
            tier: Some("Standard".to_string()),
        });

        Ok(PutConfirmation {
            version,
            tier: Some("Standard".to_string()),
        })
    }

    fn delete_parameter(&self, name: &str) -> Result<(), UpstreamError> {
        self.record_call();
        self.deletes
            .lock()
            .expect("poisoned mutex")
            .push(name.to_string());
        if let Some(error) = self.failures.lock().expect("poisoned mutex").delete.clone() {
            return Err(error);
        }

        self.parameters
            .lock()
            .expect("poisoned mutex")
            .remove(name)
            .map(|_| ())
            .ok_or(UpstreamError::NotFound)
    }

    fn parameter_history(&self, name: &str) -> Result<Vec<ParameterVersion>, UpstreamError> {
        self.record_call();
        if let Some(error) = self.failures.lock().expect("poisoned mutex").history.clone() {
            return Err(error);
        }

        self.parameters
            .lock()
            .expect("poisoned mutex")
            .get(name)
            .cloned()
            .ok_or(UpstreamError::NotFound)
    }
}

/// Key service whose ciphertext can be reversed with [`ReversibleKeyService::decrypt`].
///
/// The plaintext is XORed with a keystream derived from the key id and the
/// encryption context, so decrypting with a different key or context does not
/// yield the original bytes.
#[derive(Debug, Default)]
pub struct ReversibleKeyService {
    requests: Mutex<Vec<EncryptRequest>>,
    failure: Option<String>,
}

impl ReversibleKeyService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn requests(&self) -> Vec<EncryptRequest> {
        self.requests.lock().expect("poisoned mutex").clone()
    }

    pub fn decrypt(&self, key_id: &str, context: Option<(&str, &str)>, ciphertext: &[u8]) -> Vec<u8> {
        apply_keystream(key_id, context, ciphertext)
    }

    pub fn key_arn(key_id: &str) -> String {
        format!("arn:aws:kms:eu-west-1:123456789012:key/{}", key_id.trim_start_matches("alias/"))
    }
}

fn apply_keystream(key_id: &str, context: Option<(&str, &str)>, input: &[u8]) -> Vec<u8> {
    let mut material = key_id.as_bytes().to_vec();
    if let Some((name, value)) = context {
        material.extend_from_slice(name.as_bytes());
        material.push(b'=');
        material.extend_from_slice(value.as_bytes());
    }
    // FNV-1a over the whole key material seeds a xorshift stream, so every
    // output byte depends on the key id and on the full context.
    let mut state = material
        .iter()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
        })
        | 1;
    input
        .iter()
        .map(|byte| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            byte ^ (state >> 24) as u8
        })
        .collect()
}

impl KeyService for ReversibleKeyService {
    fn encrypt(&self, request: &EncryptRequest) -> Result<EncryptedValue, UpstreamError> {
        self.requests
            .lock()
            .expect("poisoned mutex")
            .push(request.clone());
        if let Some(message) = &self.failure {
            return Err(UpstreamError::Service(message.clone()));
        }

        let context = request
            .encryption_context
            .as_ref()
            .map(|context| (context.name.as_str(), context.value.as_str()));
        Ok(EncryptedValue {
            ciphertext: apply_keystream(&request.key_id, context, &request.plaintext),
            key_id: Self::key_arn(&request.key_id),
        })
    }
}

/// Records every callback instead of delivering it.
#[derive(Debug, Default)]
pub struct CapturingSignaler {
    responses: Mutex<Vec<CustomResourceResponse>>,
    attempts: Mutex<usize>,
    failure: Option<String>,
}

impl CapturingSignaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn responses(&self) -> Vec<CustomResourceResponse> {
        self.responses.lock().expect("poisoned mutex").clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().expect("poisoned mutex")
    }

    /// The only callback sent.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one callback was recorded.
    pub fn single_response(&self) -> CustomResourceResponse {
        let responses = self.responses();
        assert_eq!(responses.len(), 1, "expected exactly one callback");
        responses[0].clone()
    }
}

impl ResponseSignaler for CapturingSignaler {
    fn send(&self, _response_url: &str, response: &CustomResourceResponse) -> Result<(), String> {
        *self.attempts.lock().expect("poisoned mutex") += 1;
        if let Some(message) = &self.failure {
            return Err(message.clone());
        }
        self.responses
            .lock()
            .expect("poisoned mutex")
            .push(response.clone());
        Ok(())
    }
}

/// Shorthand for reading a callback data field.
pub fn data_field<'a>(data: &'a Option<PropertyMap>, key: &str) -> Option<&'a Value> {
    data.as_ref().and_then(|data| data.get(key))
}
