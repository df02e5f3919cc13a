//! The Zammad provider.
//!
//! Dispatches engine calls to the resources it manages and owns the client
//! binding they share.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::{SharedClient, ZammadClient};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::resource::{Resource, Response};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::ticket_priority::{TicketPriorityModel, TicketPriorityResource};
use crate::types::ImportedResource;

/// Type name of this provider; resource type names start with it.
pub const PROVIDER_TYPE_NAME: &str = "zammad";

/// Provider for Zammad helpdesk objects.
#[derive(Debug)]
pub struct ZammadProvider {
    ticket_priority: RwLock<TicketPriorityResource>,
    ticket_priority_type: String,
}

impl Default for ZammadProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ZammadProvider {
    /// An unconfigured provider. The engine binds a client through
    /// [`ProviderService::configure`].
    pub fn new() -> Self {
        Self::from_resource(TicketPriorityResource::new())
    }

    /// A provider whose resources use `client`.
    pub fn with_client(client: SharedClient) -> Self {
        Self::from_resource(TicketPriorityResource::with_client(client))
    }

    fn from_resource(ticket_priority: TicketPriorityResource) -> Self {
        let ticket_priority_type = ticket_priority.type_name(PROVIDER_TYPE_NAME);
        Self {
            ticket_priority: RwLock::new(ticket_priority),
            ticket_priority_type,
        }
    }

    /// Whether a client is bound.
    pub async fn is_configured(&self) -> bool {
        self.ticket_priority.read().await.is_configured()
    }

    fn check_type(&self, resource_type: &str) -> Result<(), ProviderError> {
        if resource_type == self.ticket_priority_type {
            Ok(())
        } else {
            Err(ProviderError::UnknownResource(resource_type.to_string()))
        }
    }
}

/// Turn a resource response into the engine's result, keeping warnings in
/// the log.
fn into_result(
    resource_type: &str,
    response: Response<TicketPriorityModel>,
) -> Result<Option<TicketPriorityModel>, ProviderError> {
    if response.has_errors() {
        return Err(ProviderError::Diagnostics(response.diagnostics));
    }
    for diagnostic in &response.diagnostics {
        warn!(resource_type, diagnostic = %diagnostic, "Resource warning");
    }
    Ok(response.state)
}

fn decode(value: serde_json::Value) -> Result<TicketPriorityModel, ProviderError> {
    Ok(serde_json::from_value(value)?)
}

fn encode(state: Option<TicketPriorityModel>) -> Result<serde_json::Value, ProviderError> {
    match state {
        Some(state) => Ok(serde_json::to_value(state)?),
        None => Ok(serde_json::Value::Null),
    }
}

#[async_trait::async_trait]
impl ProviderService for ZammadProvider {
    fn type_name(&self) -> &str {
        PROVIDER_TYPE_NAME
    }

    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ProviderConfig::schema())
            .with_resource(
                self.ticket_priority_type.clone(),
                crate::ticket_priority::schema(),
            )
    }

    #[instrument(skip(self, config), name = "provider.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        if config.is_null() {
            return Ok(vec![]);
        }
        let mut diagnostics = crate::validation::validate(&self.schema().provider, &config);
        if let Some(url) = config.get("url").and_then(|u| u.as_str()) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                diagnostics.push(
                    Diagnostic::error("Invalid Zammad URL")
                        .with_detail(format!("Expected an http(s) URL, got {}", url))
                        .with_attribute("url"),
                );
            }
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, config), name = "provider.configure")]
    async fn configure(&self, config: serde_json::Value) -> Result<Vec<Diagnostic>, ProviderError> {
        if config.is_null() {
            debug!("No provider data, leaving client unset");
            return Ok(vec![]);
        }

        let config = match ProviderConfig::from_value(config) {
            Ok(config) => config,
            Err(e) => {
                return Ok(vec![
                    Diagnostic::error("Invalid provider configuration").with_detail(e.to_string())
                ])
            },
        };
        let client = match ZammadClient::new(&config) {
            Ok(client) => client,
            Err(e) => {
                return Ok(vec![
                    Diagnostic::error("Unable to create Zammad client").with_detail(e.to_string())
                ])
            },
        };

        info!(url = %config.url, "Configured Zammad client");
        let client: SharedClient = Arc::new(client);
        self.ticket_priority.write().await.configure(Some(client));
        Ok(vec![])
    }

    #[instrument(skip(self, state), name = "provider.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        self.check_type(resource_type)?;
        if version == 0 {
            Ok(state)
        } else {
            Err(ProviderError::Validation(format!(
                "unsupported schema version {} for {}",
                version, resource_type
            )))
        }
    }

    #[instrument(skip(self, planned_state), name = "provider.create")]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        self.check_type(resource_type)?;
        let plan = decode(planned_state)?;
        let response = self.ticket_priority.read().await.create(plan).await;
        encode(into_result(resource_type, response)?)
    }

    #[instrument(skip(self, current_state), name = "provider.read")]
    async fn read(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        self.check_type(resource_type)?;
        let state = decode(current_state)?;
        let response = self.ticket_priority.read().await.read(state).await;
        encode(into_result(resource_type, response)?)
    }

    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: serde_json::Value,
        planned_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        self.check_type(resource_type)?;
        let state = decode(prior_state)?;
        let plan = decode(planned_state)?;
        let response = self.ticket_priority.read().await.update(plan, state).await;
        encode(into_result(resource_type, response)?)
    }

    #[instrument(skip(self, current_state), name = "provider.delete")]
    async fn delete(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<(), ProviderError> {
        self.check_type(resource_type)?;
        let state = decode(current_state)?;
        let response = self.ticket_priority.read().await.delete(state).await;
        into_result(resource_type, response).map(|_| ())
    }

    #[instrument(skip(self), name = "provider.import_resource")]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.check_type(resource_type)?;
        let response = self.ticket_priority.read().await.import_state(id);
        let state = encode(into_result(resource_type, response)?)?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        assert_error_contains, assert_no_errors, assert_plan_changes_attribute,
        assert_plan_creates, assert_plan_does_not_change_attribute, assert_plan_no_changes,
        assert_plan_updates_in_place, MockOperation, MockTicketPriorityApi, ProviderTester,
    };
    use crate::value::is_unknown_json;
    use serde_json::{json, Value};
    use tokio_test::{assert_err, assert_ok};

    const TYPE: &str = "zammad_ticket_priority";

    fn tester() -> (ProviderTester<ZammadProvider>, Arc<MockTicketPriorityApi>) {
        let api = Arc::new(MockTicketPriorityApi::new());
        (
            ProviderTester::new(ZammadProvider::with_client(api.clone())),
            api,
        )
    }

    #[test]
    fn test_metadata() {
        let provider = ZammadProvider::new();
        let metadata = provider.metadata();
        assert_eq!(metadata.type_name, "zammad");
        assert_eq!(metadata.resources, vec![TYPE.to_string()]);
    }

    #[tokio::test]
    async fn test_configure_without_data_is_noop() {
        let provider = ZammadProvider::new();
        let diagnostics = assert_ok!(provider.configure(Value::Null).await);
        assert!(diagnostics.is_empty());
        assert!(!provider.is_configured().await);

        // Lifecycle calls fail instead of panicking
        let err = assert_err!(provider.create(TYPE, json!({"name": "x"})).await);
        assert!(err.to_string().contains("Unconfigured client"));
    }

    #[tokio::test]
    async fn test_configure_binds_client() {
        let provider = ZammadProvider::new();
        let diagnostics = provider
            .configure(json!({"url": "https://zammad.example.com", "token": "t"}))
            .await
            .unwrap();
        assert_no_errors(&diagnostics);
        assert!(provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_configure_reports_bad_config() {
        let provider = ZammadProvider::new();
        let diagnostics = provider
            .configure(json!({"url": "ftp://zammad.example.com", "token": "t"}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "Invalid provider configuration");
        assert!(!provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_validate_provider_config() {
        let (tester, _api) = tester();
        assert!(tester
            .validate_provider_config(json!({"url": "https://zammad.example.com"}))
            .await
            .is_ok());
        assert!(tester
            .validate_provider_config(json!({"url": "zammad.example.com"}))
            .await
            .is_err());
        assert!(tester
            .validate_provider_config(json!({"token": 5}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let (tester, _api) = tester();
        assert!(tester
            .validate_resource_config(TYPE, json!({"name": "Urgent"}))
            .await
            .is_ok());
        assert!(tester
            .validate_resource_config(TYPE, json!({"name": "Urgent", "id": "1"}))
            .await
            .is_err());
        assert!(tester
            .validate_resource_config("zammad_group", json!({}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let (tester, _api) = tester();
        let err = tester.create("zammad_group", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
        let err = tester.import_resource("zammad_group", "1").await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_plan_create_defaults_active() {
        let (tester, _api) = tester();
        let plan = tester
            .plan_create(TYPE, json!({"name": "Urgent"}))
            .await
            .unwrap();

        assert_plan_creates(&plan);
        assert_eq!(plan.planned_state["active"], true);
        assert!(is_unknown_json(&plan.planned_state["id"]));
        assert_eq!(plan.planned_state["note"], Value::Null);
    }

    #[tokio::test]
    async fn test_create_then_read_round_trips() {
        let (tester, _api) = tester();
        let config = json!({"name": "Urgent", "ui_color": "high-priority"});

        let plan = tester.plan_create(TYPE, config).await.unwrap();
        let created = tester.create(TYPE, plan.planned_state).await.unwrap();
        let read = tester.read(TYPE, created.clone()).await.unwrap();

        assert_eq!(created, read);
        assert_eq!(read["id"], "1");
        assert_eq!(read["name"], "Urgent");
        assert_eq!(read["ui_color"], "high-priority");
        assert_eq!(read["note"], Value::Null);
        assert_eq!(read["ui_icon"], Value::Null);
        assert_eq!(read["active"], true);
        assert_eq!(read["default_create"], false);
        assert_eq!(read["created_by_id"], 1);
        assert!(read["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_plan_after_create_has_no_changes() {
        let (tester, _api) = tester();
        let config = json!({"name": "Urgent", "active": false});
        let state = tester.lifecycle_create(TYPE, config.clone()).await.unwrap();

        let plan = tester.plan_update(TYPE, state, config).await.unwrap();
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_plan_keeps_inactive_state_when_active_omitted() {
        let (tester, api) = tester();
        let config = json!({"name": "Normal"});
        let state = tester.lifecycle_create(TYPE, config.clone()).await.unwrap();
        assert_eq!(state["active"], true);

        // Deactivated in Zammad directly
        api.modify(1, |tp| tp.active = false);
        let state = tester.read(TYPE, state).await.unwrap();
        assert_eq!(state["active"], false);

        let plan = tester.plan_update(TYPE, state, config).await.unwrap();
        assert_eq!(plan.planned_state["active"], false);
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_update_changes_only_plan_fields() {
        let (tester, api) = tester();
        let state = tester
            .lifecycle_create(TYPE, json!({"name": "Normal", "note": "keep"}))
            .await
            .unwrap();

        let plan = tester
            .plan_update(TYPE, state.clone(), json!({"name": "High", "note": "keep"}))
            .await
            .unwrap();
        assert_plan_changes_attribute(&plan, "name");
        assert_plan_does_not_change_attribute(&plan, "note");
        assert_plan_updates_in_place(&plan);

        let updated = tester
            .update(TYPE, state.clone(), plan.planned_state)
            .await
            .unwrap();
        assert_eq!(updated["id"], state["id"]);
        assert_eq!(updated["name"], "High");
        assert_eq!(updated["note"], "keep");
        assert_eq!(updated["created_at"], state["created_at"]);
        assert_ne!(updated["updated_at"], state["updated_at"]);
        assert_eq!(updated["updated_by_id"], api.get(1).unwrap().updated_by_id);
    }

    #[tokio::test]
    async fn test_delete() {
        let (tester, api) = tester();
        let state = tester
            .lifecycle_create(TYPE, json!({"name": "Temp"}))
            .await
            .unwrap();

        tester.lifecycle_delete(TYPE, state).await.unwrap();
        assert_eq!(api.len(), 0);
    }

    #[tokio::test]
    async fn test_delete_rejected_surfaces_id() {
        let (tester, api) = tester();
        let state = tester
            .lifecycle_create(TYPE, json!({"name": "Temp"}))
            .await
            .unwrap();
        api.fail_next(MockOperation::Delete, "in use by tickets");

        let err = tester.delete(TYPE, state).await.unwrap_err();
        let diagnostics = err.into_diagnostics();
        assert_error_contains(&diagnostics, "Error deleting ticket_priority");
        let detail = diagnostics[0].detail.as_deref().unwrap();
        assert!(detail.contains("ticket_priority 1"));
        assert!(detail.contains("in use by tickets"));
        assert_eq!(api.len(), 1);
    }

    #[tokio::test]
    async fn test_read_with_malformed_id() {
        let (tester, _api) = tester();
        let err = tester
            .read(TYPE, json!({"id": "seven", "name": "x"}))
            .await
            .unwrap_err();
        assert_error_contains(&err.into_diagnostics(), "Error reading ID");
    }

    #[tokio::test]
    async fn test_import_then_read() {
        let (tester, api) = tester();
        api.set_next_id(42);
        api.insert(crate::client::TicketPriority {
            name: "2 normal".to_string(),
            active: true,
            default_create: true,
            ..Default::default()
        });

        let imported = tester.import_resource(TYPE, "42").await.unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].resource_type, TYPE);
        assert_eq!(imported[0].state["id"], "42");
        assert_eq!(imported[0].state["name"], Value::Null);

        let state = tester.read(TYPE, imported[0].state.clone()).await.unwrap();
        assert_eq!(state["id"], "42");
        assert_eq!(state["name"], "2 normal");
        assert_eq!(state["default_create"], true);
        assert_eq!(state["note"], Value::Null);
    }

    #[tokio::test]
    async fn test_lifecycle_crud() {
        let (tester, api) = tester();
        let final_state = tester
            .lifecycle_crud(
                TYPE,
                json!({"name": "initial", "ui_icon": "low"}),
                json!({"name": "updated"}),
            )
            .await
            .unwrap();

        assert_eq!(final_state["name"], "updated");
        assert_eq!(final_state["ui_icon"], Value::Null);
        assert_eq!(api.len(), 0);
    }

    #[tokio::test]
    async fn test_upgrade_resource_state() {
        let (tester, _api) = tester();
        let state = json!({"id": "1"});
        assert_eq!(
            tester
                .upgrade_resource_state(TYPE, 0, state.clone())
                .await
                .unwrap(),
            state
        );
        assert!(tester.upgrade_resource_state(TYPE, 1, state).await.is_err());
    }
}
