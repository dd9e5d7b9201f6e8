use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::Rng;
use tracing::info;

use crate::adapters::parameter_store::ParameterStore;
use crate::runtime::contract::{
    LifecycleEvent, PropertyMap, PutParameterRequest, RequestType, FAILED_PHYSICAL_RESOURCE_ID,
};
use crate::runtime::error::{HandlerError, UpstreamError};
use crate::runtime::password::PasswordGenerator;
use crate::runtime::properties::{SecureParameterProperties, ValueSource};

use super::{response_data, HandlerOutput, ResourceHandler};

pub const SECURE_PARAMETER_RESOURCE_TYPE: &str = "Custom::SecureParameter";
pub const PASSWORD_PARAMETER_RESOURCE_TYPE: &str = "Custom::SecureParameterWithPassword";

/// How a secure-parameter resource obtains its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// `Value` is mandatory.
    Plain,
    /// Exactly one of `Value` or `GeneratePassword` must be supplied.
    OptionalPassword,
    /// Always generated from `Length` and `WithSpecialCharacters`.
    RequiredPassword,
}

impl ValueMode {
    pub fn resource_type(self) -> &'static str {
        match self {
            Self::Plain | Self::OptionalPassword => SECURE_PARAMETER_RESOURCE_TYPE,
            Self::RequiredPassword => PASSWORD_PARAMETER_RESOURCE_TYPE,
        }
    }

    pub fn parse(self, properties: &PropertyMap) -> Result<SecureParameterProperties, HandlerError> {
        match self {
            Self::Plain => SecureParameterProperties::plain(properties),
            Self::OptionalPassword => SecureParameterProperties::with_optional_password(properties),
            Self::RequiredPassword => SecureParameterProperties::with_required_password(properties),
        }
    }
}

/// Writes a SecureString parameter on Create/Update and deletes it on Delete.
///
/// The parameter name is the physical id. Create refuses to take over a
/// parameter that already exists: the existence check runs first, and the
/// write itself is issued without overwrite so a parameter created in between
/// is still reported as a conflict. Update always overwrites.
#[derive(Debug)]
pub struct SecureParameterHandler<S, R = StdRng> {
    store: S,
    mode: ValueMode,
    generator: Mutex<PasswordGenerator<R>>,
}

impl<S: ParameterStore> SecureParameterHandler<S, StdRng> {
    pub fn new(store: S, mode: ValueMode) -> Self {
        Self::with_generator(store, mode, PasswordGenerator::from_entropy())
    }
}

impl<S: ParameterStore, R: Rng> SecureParameterHandler<S, R> {
    pub fn with_generator(store: S, mode: ValueMode, generator: PasswordGenerator<R>) -> Self {
        Self {
            store,
            mode,
            generator: Mutex::new(generator),
        }
    }

    fn resolve_value(&self, source: &ValueSource) -> Result<String, HandlerError> {
        match source {
            ValueSource::Explicit(value) => Ok(value.clone()),
            ValueSource::Generated(spec) => {
                let mut generator = self.generator.lock().unwrap_or_else(PoisonError::into_inner);
                Ok(generator.generate(spec.length, spec.include_specials)?)
            }
        }
    }
}

impl<S: ParameterStore, R: Rng> ResourceHandler for SecureParameterHandler<S, R> {
    fn resource_type(&self) -> &'static str {
        self.mode.resource_type()
    }

    fn provision(&self, event: &LifecycleEvent) -> Result<HandlerOutput, HandlerError> {
        let properties = self.mode.parse(&event.resource_properties)?;
        let is_create = event.request_type == RequestType::Create;
        let name = properties.name;

        if is_create {
            let exists = self
                .store
                .parameter_exists(&name)
                .map_err(|error| HandlerError::upstream("ssm:DescribeParameters", error))?;
            if exists {
                return Err(HandlerError::NameConflict { name });
            }
        }

        let value = self.resolve_value(&properties.source)?;
        let confirmation = self
            .store
            .put_parameter(&PutParameterRequest {
                name: name.clone(),
                description: properties.description,
                value,
                key_id: properties.key_id,
                overwrite: !is_create,
            })
            .map_err(|error| match error {
                UpstreamError::AlreadyExists if is_create => {
                    HandlerError::NameConflict { name: name.clone() }
                }
                other => HandlerError::upstream("ssm:PutParameter", other),
            })?;

        info!(
            parameter = %name,
            version = confirmation.version,
            generated = matches!(properties.source, ValueSource::Generated(_)),
            "successfully stored parameter"
        );

        let data = response_data(&confirmation)?;
        Ok(HandlerOutput::new(name, Some(data)))
    }

    /// Deletes by the physical id the orchestrator tracks, not by the current
    /// `Name`, so a rename-by-replacement removes the old parameter.
    fn teardown(&self, event: &LifecycleEvent) -> Result<HandlerOutput, HandlerError> {
        let Some(physical_id) = event.existing_physical_id() else {
            return Err(HandlerError::validation(
                "PhysicalResourceId is required to delete a parameter",
            ));
        };

        // "0" marks a Create that never wrote anything.
        if physical_id == FAILED_PHYSICAL_RESOURCE_ID {
            info!("nothing to delete for a resource that was never created");
            return Ok(HandlerOutput::new(physical_id, None));
        }

        match self.store.delete_parameter(physical_id) {
            Ok(()) => info!(parameter = %physical_id, "successfully deleted parameter"),
            Err(UpstreamError::NotFound) => {
                info!(parameter = %physical_id, "parameter already deleted")
            }
            Err(error) => return Err(HandlerError::upstream("ssm:DeleteParameter", error)),
        }

        Ok(HandlerOutput::new(physical_id, None))
    }
}
