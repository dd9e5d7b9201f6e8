//! Typed resource-property schemas.
//!
//! Each resource type reads its `ResourceProperties` bag exactly once into one
//! of the structs below. Unknown properties (including `ServiceToken`) are
//! ignored; missing required ones are validation errors.

use serde_json::Value;

use crate::contract::{EncryptionContext, PropertyMap};
use crate::error::HandlerError;

/// Loose flag coercion kept for existing templates: `true`, `"true"`,
/// `"True"`, `"1"` and `1` are truthy, everything else is falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64() == Some(1.0),
        Value::String(text) => matches!(text.as_str(), "true" | "True" | "1"),
        _ => false,
    }
}

fn flag(properties: &PropertyMap, key: &str) -> bool {
    properties.get(key).is_some_and(is_truthy)
}

fn optional_string(properties: &PropertyMap, key: &str) -> Result<Option<String>, HandlerError> {
    match properties.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(_) => Err(HandlerError::validation(format!(
            "The resource property {key} must be a string"
        ))),
    }
}

fn required_string(properties: &PropertyMap, key: &str) -> Result<String, HandlerError> {
    optional_string(properties, key)?.ok_or_else(|| {
        HandlerError::validation(format!("The resource property {key} is required"))
    })
}

fn optional_integer(properties: &PropertyMap, key: &str) -> Result<Option<i64>, HandlerError> {
    let not_an_integer = || {
        HandlerError::validation(format!(
            "The resource property {key} must be an integer or castable to an integer"
        ))
    };

    match properties.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| not_an_integer()),
        Some(Value::Number(number)) => number.as_i64().map(Some).ok_or_else(not_an_integer),
        Some(_) => Err(not_an_integer()),
    }
}

/// Properties of a `Custom::Encrypt` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptProperties {
    pub base64_data: String,
    pub key_id: String,
    pub encryption_context: Option<EncryptionContext>,
}

impl EncryptProperties {
    pub fn from_properties(properties: &PropertyMap) -> Result<Self, HandlerError> {
        let base64_data = required_string(properties, "Base64Data")?;
        let key_id = match optional_string(properties, "KmsKeyArn")? {
            Some(value) => value,
            None => required_string(properties, "KeyId").map_err(|_| {
                HandlerError::validation("The resource property KmsKeyArn is required")
            })?,
        };

        let encryption_context = match properties.get("EncryptionContext") {
            None | Some(Value::Null) => None,
            Some(Value::Object(context)) => Some(EncryptionContext {
                name: required_string(context, "Name").map_err(|_| {
                    HandlerError::validation("EncryptionContext requires a Name")
                })?,
                value: required_string(context, "Value").map_err(|_| {
                    HandlerError::validation("EncryptionContext requires a Value")
                })?,
            }),
            Some(_) => {
                return Err(HandlerError::validation(
                    "EncryptionContext must be an object with Name and Value",
                ))
            }
        };

        Ok(Self {
            base64_data,
            key_id,
            encryption_context,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordSpec {
    pub length: i64,
    pub include_specials: bool,
}

/// Where a secure parameter's value comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum ValueSource {
    Explicit(String),
    Generated(PasswordSpec),
}

impl std::fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit(_) => f.write_str("Explicit(<redacted>)"),
            Self::Generated(spec) => f.debug_tuple("Generated").field(spec).finish(),
        }
    }
}

/// Properties shared by every secure-parameter resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureParameterProperties {
    pub name: String,
    pub description: Option<String>,
    pub key_id: String,
    pub source: ValueSource,
}

impl SecureParameterProperties {
    /// `Custom::SecureParameter` with a mandatory explicit `Value`.
    pub fn plain(properties: &PropertyMap) -> Result<Self, HandlerError> {
        let (name, description, key_id) = Self::common(properties)?;
        let value = required_string(properties, "Value")?;
        Ok(Self {
            name,
            description,
            key_id,
            source: ValueSource::Explicit(value),
        })
    }

    /// `Custom::SecureParameter` taking either `Value` or `GeneratePassword`.
    pub fn with_optional_password(properties: &PropertyMap) -> Result<Self, HandlerError> {
        let (name, description, key_id) = Self::common(properties)?;
        let explicit_value = optional_string(properties, "Value")?;
        let generate = flag(properties, "GeneratePassword");

        if explicit_value.is_some() && generate {
            return Err(HandlerError::validation(
                "You cannot use both Value and GeneratePassword",
            ));
        }

        let source = if generate {
            let length = optional_integer(properties, "GeneratePasswordLength")?.ok_or_else(|| {
                HandlerError::validation(
                    "The resource property GeneratePasswordLength is required when GeneratePassword is true",
                )
            })?;
            ValueSource::Generated(PasswordSpec {
                length,
                include_specials: flag(properties, "GeneratePasswordAllowSpecialCharacters"),
            })
        } else if let Some(value) = explicit_value {
            ValueSource::Explicit(value)
        } else {
            return Err(HandlerError::validation(
                "You must supply either Value or GeneratePassword",
            ));
        };

        Ok(Self {
            name,
            description,
            key_id,
            source,
        })
    }

    /// `Custom::SecureParameterWithPassword`, which always generates.
    pub fn with_required_password(properties: &PropertyMap) -> Result<Self, HandlerError> {
        let (name, description, key_id) = Self::common(properties)?;
        let length = optional_integer(properties, "Length")?.ok_or_else(|| {
            HandlerError::validation("The resource property Length is required")
        })?;

        Ok(Self {
            name,
            description,
            key_id,
            source: ValueSource::Generated(PasswordSpec {
                length,
                include_specials: flag(properties, "WithSpecialCharacters"),
            }),
        })
    }

    fn common(properties: &PropertyMap) -> Result<(String, Option<String>, String), HandlerError> {
        Ok((
            required_string(properties, "Name")?,
            optional_string(properties, "Description")?,
            required_string(properties, "KeyId")?,
        ))
    }
}

/// Properties of a `Custom::GetSsmValue` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsmValueProperties {
    pub name: String,
    pub version: Option<i64>,
}

impl SsmValueProperties {
    pub fn from_properties(properties: &PropertyMap) -> Result<Self, HandlerError> {
        let name = required_string(properties, "Name")?;
        let version = optional_integer(properties, "Version")?;
        if let Some(version) = version {
            if version <= 0 {
                return Err(HandlerError::validation(format!(
                    "The resource property Version must be a positive integer, got {version}"
                )));
            }
        }
        Ok(Self { name, version })
    }
}
