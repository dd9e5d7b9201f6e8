use tracing::info;

use crate::adapters::parameter_store::ParameterStore;
use crate::runtime::contract::LifecycleEvent;
use crate::runtime::error::{HandlerError, UpstreamError};
use crate::runtime::properties::SsmValueProperties;

use super::{response_data, HandlerOutput, ResourceHandler};

pub const SSM_VALUE_RESOURCE_TYPE: &str = "Custom::GetSsmValue";

/// Reads one version of an existing parameter into the callback data.
///
/// The physical id is `Name` followed by the selected version, so bumping the
/// version gives dependents a new identity to react to.
#[derive(Debug, Clone)]
pub struct SsmValueHandler<S> {
    store: S,
}

impl<S: ParameterStore> SsmValueHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ParameterStore> ResourceHandler for SsmValueHandler<S> {
    fn resource_type(&self) -> &'static str {
        SSM_VALUE_RESOURCE_TYPE
    }

    fn provision(&self, event: &LifecycleEvent) -> Result<HandlerOutput, HandlerError> {
        let SsmValueProperties { name, version } =
            SsmValueProperties::from_properties(&event.resource_properties)?;

        let exists = self
            .store
            .parameter_exists(&name)
            .map_err(|error| HandlerError::upstream("ssm:DescribeParameters", error))?;
        if !exists {
            return Err(HandlerError::NotFound { name });
        }

        let history = self
            .store
            .parameter_history(&name)
            .map_err(|error| match error {
                UpstreamError::NotFound => HandlerError::NotFound { name: name.clone() },
                other => HandlerError::upstream("ssm:GetParameterHistory", other),
            })?;

        let selected = match version {
            Some(requested) => history
                .into_iter()
                .find(|entry| entry.version == requested)
                .ok_or_else(|| HandlerError::VersionNotFound {
                    name: name.clone(),
                    version: requested,
                })?,
            None => history
                .into_iter()
                .max_by_key(|entry| entry.version)
                .ok_or_else(|| HandlerError::NotFound { name: name.clone() })?,
        };

        info!(parameter = %name, version = selected.version, "successfully retrieved parameter");

        let physical_resource_id = format!("{name}{}", selected.version);
        let data = response_data(&selected)?;
        Ok(HandlerOutput::new(physical_resource_id, Some(data)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::handlers::handle_lifecycle_event;
    use crate::runtime::contract::RequestType;
    use crate::test_helpers::{
        data_field, event_with, CapturingSignaler, InMemoryParameterStore, TEST_MODIFIED_DATE,
    };

    fn store_with_versions() -> InMemoryParameterStore {
        let store = InMemoryParameterStore::new();
        store.seed("/app/config", "first");
        store.seed("/app/config", "second");
        store.seed("/app/config", "third");
        store
    }

    #[test]
    fn latest_version_is_selected_by_default() {
        let store = store_with_versions();
        let event = event_with(RequestType::Create, json!({"Name": "/app/config"}));

        let output = SsmValueHandler::new(&store)
            .provision(&event)
            .expect("read should succeed");

        assert_eq!(output.physical_resource_id, "/app/config3");
        assert_eq!(data_field(&output.data, "Value"), Some(&Value::from("third")));
        assert_eq!(data_field(&output.data, "Version"), Some(&Value::from(3)));
        assert_eq!(
            data_field(&output.data, "LastModifiedDate"),
            Some(&Value::from(TEST_MODIFIED_DATE))
        );
        assert!(store.writes().is_empty());
    }

    #[test]
    fn requested_version_is_selected_exactly() {
        let store = store_with_versions();
        let event = event_with(
            RequestType::Update,
            json!({"Name": "/app/config", "Version": "2"}),
        );

        let output = SsmValueHandler::new(&store)
            .provision(&event)
            .expect("read should succeed");

        assert_eq!(output.physical_resource_id, "/app/config2");
        assert_eq!(data_field(&output.data, "Value"), Some(&Value::from("second")));
    }

    #[test]
    fn missing_version_is_reported() {
        let store = store_with_versions();
        let event = event_with(
            RequestType::Create,
            json!({"Name": "/app/config", "Version": 9}),
        );

        let error = SsmValueHandler::new(&store)
            .provision(&event)
            .expect_err("unknown version should fail");

        assert_eq!(
            error,
            HandlerError::VersionNotFound {
                name: "/app/config".to_string(),
                version: 9,
            }
        );
    }

    #[test]
    fn missing_parameter_reports_failed() {
        let store = InMemoryParameterStore::new();
        let signaler = CapturingSignaler::new();
        let event = event_with(RequestType::Create, json!({"Name": "/app/missing"}));

        let result = handle_lifecycle_event(&SsmValueHandler::new(&store), &event, &signaler, "s")
            .expect("delivery should succeed");

        assert!(!result.is_success());
        assert_eq!(result.physical_resource_id, "0");
        assert!(signaler
            .single_response()
            .reason
            .starts_with("A parameter named /app/missing does not exist"));
    }

    #[test]
    fn history_failure_is_an_upstream_error() {
        let store = store_with_versions();
        store.fail_history_with(UpstreamError::Service("InternalServerError".to_string()));
        let event = event_with(RequestType::Create, json!({"Name": "/app/config"}));

        let error = SsmValueHandler::new(&store)
            .provision(&event)
            .expect_err("history failure should propagate");

        assert_eq!(error.kind(), "upstream_service_error");
    }

    #[test]
    fn existence_check_failure_reports_failed() {
        let store = store_with_versions();
        store.fail_exists_with(UpstreamError::Service("AccessDeniedException".to_string()));
        let signaler = CapturingSignaler::new();
        let event = event_with(RequestType::Create, json!({"Name": "/app/config"}));

        let error = SsmValueHandler::new(&store)
            .provision(&event)
            .expect_err("describe failure should propagate");
        assert_eq!(error.kind(), "upstream_service_error");

        let result = handle_lifecycle_event(&SsmValueHandler::new(&store), &event, &signaler, "s")
            .expect("delivery should succeed");

        assert!(!result.is_success());
        assert_eq!(result.physical_resource_id, "0");
        assert!(signaler
            .single_response()
            .reason
            .contains("ssm:DescribeParameters failed: AccessDeniedException"));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn delete_is_side_effect_free() {
        let store = store_with_versions();
        let signaler = CapturingSignaler::new();
        let event = event_with(RequestType::Delete, json!({"Name": "/app/config"}))
            .with_physical_resource_id("/app/config3");

        let result = handle_lifecycle_event(&SsmValueHandler::new(&store), &event, &signaler, "s")
            .expect("delivery should succeed");

        assert!(result.is_success());
        assert_eq!(result.physical_resource_id, "/app/config3");
        assert_eq!(store.network_calls(), 0);
        assert_eq!(store.current_value("/app/config").as_deref(), Some("third"));
    }
}
