use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssm::primitives::DateTimeFormat;
use aws_sdk_ssm::types::{ParameterHistory, ParameterStringFilter, ParameterType};

use crate::runtime::contract::{
    ParameterVersion, PutConfirmation, PutParameterRequest, SECURE_STRING_PARAMETER_TYPE,
};
use crate::runtime::error::UpstreamError;

use super::run_blocking;

pub trait ParameterStore {
    fn parameter_exists(&self, name: &str) -> Result<bool, UpstreamError>;

    fn put_parameter(&self, request: &PutParameterRequest)
        -> Result<PutConfirmation, UpstreamError>;

    fn delete_parameter(&self, name: &str) -> Result<(), UpstreamError>;

    /// Every recorded version of `name`, oldest first, with decrypted values.
    fn parameter_history(&self, name: &str) -> Result<Vec<ParameterVersion>, UpstreamError>;
}

impl<T: ParameterStore + ?Sized> ParameterStore for &T {
    fn parameter_exists(&self, name: &str) -> Result<bool, UpstreamError> {
        (**self).parameter_exists(name)
    }

    fn put_parameter(
        &self,
        request: &PutParameterRequest,
    ) -> Result<PutConfirmation, UpstreamError> {
        (**self).put_parameter(request)
    }

    fn delete_parameter(&self, name: &str) -> Result<(), UpstreamError> {
        (**self).delete_parameter(name)
    }

    fn parameter_history(&self, name: &str) -> Result<Vec<ParameterVersion>, UpstreamError> {
        (**self).parameter_history(name)
    }
}

/// SSM Parameter Store backed implementation.
#[derive(Debug, Clone)]
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

impl ParameterStore for SsmParameterStore {
    fn parameter_exists(&self, name: &str) -> Result<bool, UpstreamError> {
        let filter = ParameterStringFilter::builder()
            .key("Name")
            .values(name)
            .build()
            .map_err(|error| UpstreamError::Service(format!("invalid parameter filter: {error}")))?;
        let client = self.client.clone();

        let output = run_blocking(async move {
            client
                .describe_parameters()
                .parameter_filters(filter)
                .send()
                .await
        })
        .map_err(|error| UpstreamError::Service(DisplayErrorContext(&error).to_string()))?;

        Ok(!output.parameters().is_empty())
    }

    fn put_parameter(
        &self,
        request: &PutParameterRequest,
    ) -> Result<PutConfirmation, UpstreamError> {
        let client = self.client.clone();
        let request = request.clone();

        let output = run_blocking(async move {
            client
                .put_parameter()
                .name(request.name)
                .set_description(request.description)
                .value(request.value)
                .r#type(ParameterType::SecureString)
                .key_id(request.key_id)
                .overwrite(request.overwrite)
                .send()
                .await
        })
        .map_err(|error| {
            classify_sdk_error(
                error,
                |service_error| service_error.is_parameter_already_exists(),
                UpstreamError::AlreadyExists,
            )
        })?;

        Ok(PutConfirmation {
            version: output.version(),
            tier: output.tier().map(|tier| tier.as_str().to_string()),
        })
    }

    fn delete_parameter(&self, name: &str) -> Result<(), UpstreamError> {
        let client = self.client.clone();
        let name = name.to_string();

        run_blocking(async move { client.delete_parameter().name(name).send().await })
            .map(|_| ())
            .map_err(|error| {
                classify_sdk_error(
                    error,
                    |service_error| service_error.is_parameter_not_found(),
                    UpstreamError::NotFound,
                )
            })
    }

    fn parameter_history(&self, name: &str) -> Result<Vec<ParameterVersion>, UpstreamError> {
        let mut versions = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let client = self.client.clone();
            let request_name = name.to_string();
            let token = next_token.take();

            let output = run_blocking(async move {
                client
                    .get_parameter_history()
                    .name(request_name)
                    .with_decryption(true)
                    .set_next_token(token)
                    .send()
                    .await
            })
            .map_err(|error| {
                classify_sdk_error(
                    error,
                    |service_error| service_error.is_parameter_not_found(),
                    UpstreamError::NotFound,
                )
            })?;

            versions.extend(
                output
                    .parameters()
                    .iter()
                    .map(|entry| to_parameter_version(name, entry)),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(versions)
    }
}

/// Maps one specific service error onto `kind`; everything else keeps the SDK's
/// full error chain as its message.
fn classify_sdk_error<E, R>(
    error: SdkError<E, R>,
    is_kind: impl Fn(&E) -> bool,
    kind: UpstreamError,
) -> UpstreamError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    if let SdkError::ServiceError(service_error) = &error {
        if is_kind(service_error.err()) {
            return kind;
        }
    }
    UpstreamError::Service(DisplayErrorContext(&error).to_string())
}

fn to_parameter_version(name: &str, entry: &ParameterHistory) -> ParameterVersion {
    ParameterVersion {
        name: entry.name().unwrap_or(name).to_string(),
        parameter_type: entry
            .r#type()
            .map(|kind| kind.as_str().to_string())
            .unwrap_or_else(|| SECURE_STRING_PARAMETER_TYPE.to_string()),
        key_id: entry.key_id().map(String::from),
        last_modified_date: entry
            .last_modified_date()
            .and_then(|date| date.fmt(DateTimeFormat::DateTime).ok()),
        last_modified_user: entry.last_modified_user().map(String::from),
        description: entry.description().map(String::from),
        value: entry.value().unwrap_or_default().to_string(),
        version: entry.version(),
        labels: entry.labels().to_vec(),
        tier: entry.tier().map(|tier| tier.as_str().to_string()),
    }
}
