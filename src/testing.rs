//! Testing utilities for the provider.
//!
//! [`ProviderTester`] drives a [`ProviderService`] the way the engine does,
//! and [`MockTicketPriorityApi`] stands in for a Zammad instance.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hemmer_provider_zammad::testing::{MockTicketPriorityApi, ProviderTester};
//! use hemmer_provider_zammad::ZammadProvider;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let api = Arc::new(MockTicketPriorityApi::new());
//! let tester = ProviderTester::new(ZammadProvider::with_client(api.clone()));
//!
//! let state = tester
//!     .lifecycle_create("zammad_ticket_priority", json!({"name": "Urgent"}))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(state["name"], "Urgent");
//! assert_eq!(api.len(), 1);
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::client::{ClientError, TicketPriority, TicketPriorityApi};
use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Test harness around a [`ProviderService`].
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// The provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Resource type names the provider manages.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration; error diagnostics become `Err`.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider; error diagnostics become `Err`.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration; error diagnostics become `Err`.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource that does not exist yet.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan a change to an existing resource.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Plan the destruction of a resource.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Plan with every input explicit.
    pub async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, prior_state, proposed_state, config)
            .await
    }

    /// Create a resource from a planned state.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a resource's state.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Apply a planned state to an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import a resource by id.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Upgrade state written by an older schema version.
    pub async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .upgrade_resource_state(resource_type, version, state)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Plan, create, then read. Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan, update, then read. Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read(resource_type, updated).await
    }

    /// Plan the destruction, then delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Create, update and delete a resource. Returns the state after the
    /// update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone())
            .await?;
        Ok(updated)
    }
}

/// Failure of a tester operation.
#[derive(Debug, Error)]
pub enum TestError {
    /// The operation reported error diagnostics.
    #[error("{}", describe(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// The operation returned a provider error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn describe(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):", diagnostics.len());
    for diagnostic in diagnostics {
        out.push_str("\n  ");
        out.push_str(&diagnostic.to_string());
    }
    out
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan creates the resource.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        plan.has_changes(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        !plan.has_changes(),
        "Expected no changes, but got {:?}",
        changed_paths(plan)
    );
}

/// Assert that a plan has changes.
///
/// # Panics
///
/// Panics if the plan has no changes.
pub fn assert_plan_has_changes(plan: &PlanResult) {
    assert!(
        plan.has_changes(),
        "Expected plan to have changes, but got no changes"
    );
}

/// Assert that a plan does not require replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert that a plan changes the attribute at `path`.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        changed_paths(plan)
    );
}

/// Assert that a plan leaves the attribute at `path` alone.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().all(|c| c.path != path),
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.to_string())
        .collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors
    );
}

/// Assert that diagnostics contain at least one error.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.iter().any(Diagnostic::is_error),
        "Expected at least one error, but got none"
    );
}

/// Assert that some error diagnostic's summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

// =========================================================================
// Mock API
// =========================================================================

/// Operation of [`MockTicketPriorityApi`], used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    /// `create_ticket_priority`
    Create,
    /// `get_ticket_priority`
    Get,
    /// `update_ticket_priority`
    Update,
    /// `delete_ticket_priority`
    Delete,
}

/// A call received by [`MockTicketPriorityApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// Create with the requested name.
    Create(String),
    /// Get by id.
    Get(i64),
    /// Update by id.
    Update(i64),
    /// Delete by id.
    Delete(i64),
}

#[derive(Debug)]
struct MockState {
    priorities: BTreeMap<i64, TicketPriority>,
    next_id: i64,
    clock: u32,
    default_note: String,
    failures: HashMap<MockOperation, String>,
    calls: Vec<MockCall>,
}

impl MockState {
    fn tick(&mut self) -> String {
        self.clock += 1;
        format!(
            "2024-01-01T{:02}:{:02}:{:02}Z",
            self.clock / 3600 % 24,
            self.clock / 60 % 60,
            self.clock % 60
        )
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_failure(&mut self, op: MockOperation) -> Result<(), ClientError> {
        match self.failures.remove(&op) {
            Some(message) => Err(ClientError::Api {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }
}

/// In-memory Zammad ticket priority store.
///
/// Ids start at 1. Every write advances a clock used for `created_at` and
/// `updated_at`. Records are created by user 1 and updated by user 2.
#[derive(Debug)]
pub struct MockTicketPriorityApi {
    state: Mutex<MockState>,
}

impl Default for MockTicketPriorityApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTicketPriorityApi {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                priorities: BTreeMap::new(),
                next_id: 1,
                clock: 0,
                default_note: String::new(),
                failures: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `tp` under the next id, as if created outside the provider.
    pub fn insert(&self, mut tp: TicketPriority) -> i64 {
        let mut state = self.lock();
        let id = state.allocate_id();
        let now = state.tick();
        tp.id = id;
        tp.created_by_id = 1;
        tp.updated_by_id = 1;
        tp.created_at = now.clone();
        tp.updated_at = now;
        state.priorities.insert(id, tp);
        id
    }

    /// The stored priority `id`.
    pub fn get(&self, id: i64) -> Option<TicketPriority> {
        self.lock().priorities.get(&id).cloned()
    }

    /// Number of stored priorities.
    pub fn len(&self) -> usize {
        self.lock().priorities.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Change a stored priority out of band. Returns false if it is missing.
    pub fn modify(&self, id: i64, f: impl FnOnce(&mut TicketPriority)) -> bool {
        match self.lock().priorities.get_mut(&id) {
            Some(tp) => {
                f(tp);
                true
            },
            None => false,
        }
    }

    /// Note the server fills in when a create request leaves it empty.
    pub fn set_default_note(&self, note: &str) {
        self.lock().default_note = note.to_string();
    }

    /// Id given to the next created or inserted priority.
    pub fn set_next_id(&self, id: i64) {
        self.lock().next_id = id;
    }

    /// Make the next `op` fail with an API error carrying `message`.
    pub fn fail_next(&self, op: MockOperation, message: &str) {
        self.lock().failures.insert(op, message.to_string());
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }
}

#[async_trait]
impl TicketPriorityApi for MockTicketPriorityApi {
    async fn create_ticket_priority(
        &self,
        tp: &TicketPriority,
    ) -> Result<TicketPriority, ClientError> {
        let mut state = self.lock();
        state.calls.push(MockCall::Create(tp.name.clone()));
        state.check_failure(MockOperation::Create)?;

        let id = state.allocate_id();
        let now = state.tick();
        let note = if tp.note.is_empty() {
            state.default_note.clone()
        } else {
            tp.note.clone()
        };
        let created = TicketPriority {
            id,
            note,
            created_by_id: 1,
            updated_by_id: 1,
            created_at: now.clone(),
            updated_at: now,
            ..tp.clone()
        };
        state.priorities.insert(id, created.clone());
        Ok(created)
    }

    async fn get_ticket_priority(&self, id: i64) -> Result<TicketPriority, ClientError> {
        let mut state = self.lock();
        state.calls.push(MockCall::Get(id));
        state.check_failure(MockOperation::Get)?;
        state
            .priorities
            .get(&id)
            .cloned()
            .ok_or(ClientError::NotFound(id))
    }

    async fn update_ticket_priority(
        &self,
        tp: &TicketPriority,
    ) -> Result<TicketPriority, ClientError> {
        let mut state = self.lock();
        state.calls.push(MockCall::Update(tp.id));
        state.check_failure(MockOperation::Update)?;

        let now = state.tick();
        let stored = state
            .priorities
            .get_mut(&tp.id)
            .ok_or(ClientError::NotFound(tp.id))?;
        stored.name = tp.name.clone();
        stored.note = tp.note.clone();
        stored.ui_color = tp.ui_color.clone();
        stored.ui_icon = tp.ui_icon.clone();
        stored.active = tp.active;
        stored.default_create = tp.default_create;
        stored.updated_by_id = 2;
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn delete_ticket_priority(&self, id: i64) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(MockCall::Delete(id));
        state.check_failure(MockOperation::Delete)?;
        state
            .priorities
            .remove(&id)
            .map(|_| ())
            .ok_or(ClientError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ZammadProvider;
    use serde_json::json;
    use std::sync::Arc;

    const TYPE: &str = "zammad_ticket_priority";

    fn tester() -> ProviderTester<ZammadProvider> {
        ProviderTester::new(ZammadProvider::with_client(Arc::new(
            MockTicketPriorityApi::new(),
        )))
    }

    #[tokio::test]
    async fn test_tester_configure() {
        let tester = tester();
        assert!(tester.configure(Value::Null).await.is_ok());

        let err = tester
            .configure(json!({"url": "not a url", "token": "t"}))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(_)));
    }

    #[test]
    fn test_tester_schema() {
        let tester = tester();
        assert!(tester.schema().resources.contains_key(TYPE));
        assert_eq!(tester.resource_types(), vec![TYPE.to_string()]);
    }

    #[tokio::test]
    async fn test_tester_plan_delete() {
        let tester = tester();
        let state = tester
            .lifecycle_create(TYPE, json!({"name": "Low"}))
            .await
            .unwrap();

        let plan = tester.plan_delete(TYPE, state).await.unwrap();
        assert_plan_has_changes(&plan);
        assert_eq!(plan.planned_state, Value::Null);
    }

    #[tokio::test]
    async fn test_tester_plan_with_proposed_state() {
        let tester = tester();
        let plan = tester
            .plan(TYPE, None, json!({"name": "Low"}), Value::Null)
            .await
            .unwrap();
        assert_plan_creates(&plan);
        assert_eq!(plan.planned_state["name"], "Low");
    }

    #[tokio::test]
    async fn test_tester_lifecycle_update() {
        let tester = tester();
        let state = tester
            .lifecycle_create(TYPE, json!({"name": "Low"}))
            .await
            .unwrap();
        let updated = tester
            .lifecycle_update(TYPE, state, json!({"name": "Lower", "active": false}))
            .await
            .unwrap();
        assert_eq!(updated["name"], "Lower");
        assert_eq!(updated["active"], false);
    }

    #[tokio::test]
    async fn test_mock_store() {
        let api = MockTicketPriorityApi::new();
        assert!(api.is_empty());

        let request = TicketPriority {
            name: "1 low".to_string(),
            ..Default::default()
        };
        let created = api.create_ticket_priority(&request).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.created_at, created.updated_at);

        let mut change = created.clone();
        change.name = "1 lowest".to_string();
        let updated = api.update_ticket_priority(&change).await.unwrap();
        assert_eq!(updated.updated_by_id, 2);
        assert!(updated.updated_at > created.updated_at);

        api.delete_ticket_priority(1).await.unwrap();
        assert!(matches!(
            api.get_ticket_priority(1).await,
            Err(ClientError::NotFound(1))
        ));
        assert_eq!(
            api.calls(),
            vec![
                MockCall::Create("1 low".to_string()),
                MockCall::Update(1),
                MockCall::Delete(1),
                MockCall::Get(1),
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_failure_is_one_shot() {
        let api = MockTicketPriorityApi::new();
        let id = api.insert(TicketPriority::default());
        api.fail_next(MockOperation::Get, "boom");

        let err = api.get_ticket_priority(id).await.unwrap_err();
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
        assert!(api.get_ticket_priority(id).await.is_ok());
        assert!(!api.modify(id + 1, |tp| tp.name.clear()));
    }

    #[test]
    fn test_assert_no_errors() {
        assert_no_errors(&[Diagnostic::warning("Just a warning")]);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        assert_no_errors(&[Diagnostic::error("An error")]);
    }

    #[test]
    fn test_assert_has_errors() {
        assert_has_errors(&[Diagnostic::error("An error")]);
    }

    #[test]
    #[should_panic(expected = "Expected an error containing 'missing'")]
    fn test_assert_error_contains_fails() {
        assert_error_contains(&[Diagnostic::warning("missing")], "missing");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("name"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = err.to_string();
        assert!(display.starts_with("Operation failed with 2 diagnostic(s):"));
        assert!(display.contains("First error"));
        assert!(display.contains("name"));
        assert!(display.contains("Second error: More info"));
    }
}
