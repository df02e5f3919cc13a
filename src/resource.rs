//! The lifecycle contract every managed resource implements.

use async_trait::async_trait;

use crate::client::SharedClient;
use crate::schema::{has_errors, Diagnostic, Schema};

/// Outcome of a resource lifecycle call.
///
/// `state` is what the engine should persist; `None` means the resource is
/// absent (after a failed create, a failed update or a delete).
#[derive(Debug, Clone, PartialEq)]
pub struct Response<M> {
    /// The state to persist.
    pub state: Option<M>,
    /// Diagnostics raised by the call.
    pub diagnostics: Vec<Diagnostic>,
}

impl<M> Response<M> {
    /// A successful call producing `state`.
    pub fn ok(state: M) -> Self {
        Self {
            state: Some(state),
            diagnostics: Vec::new(),
        }
    }

    /// A successful call leaving no state behind.
    pub fn removed() -> Self {
        Self {
            state: None,
            diagnostics: Vec::new(),
        }
    }

    /// A failed call; `state` is what the engine keeps.
    pub fn failed(state: Option<M>, diagnostic: Diagnostic) -> Self {
        Self {
            state,
            diagnostics: vec![diagnostic],
        }
    }

    /// Returns true if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }
}

/// A managed resource.
///
/// Every lifecycle method the engine may call is declared here; there are no
/// optional capabilities discovered at runtime.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Typed plan/state model.
    type Model: Send + Sync;

    /// Resource type name under the given provider type name.
    fn type_name(&self, provider_type_name: &str) -> String;

    /// Schema of the resource's attributes.
    fn schema(&self) -> Schema;

    /// Bind the shared API client. `None` leaves the resource unconfigured.
    fn configure(&mut self, provider_data: Option<SharedClient>);

    /// Create the remote object described by `plan`.
    async fn create(&self, plan: Self::Model) -> Response<Self::Model>;

    /// Refresh `state` from the remote object.
    async fn read(&self, state: Self::Model) -> Response<Self::Model>;

    /// Apply `plan` to the remote object tracked by `state`.
    async fn update(&self, plan: Self::Model, state: Self::Model) -> Response<Self::Model>;

    /// Delete the remote object tracked by `state`.
    async fn delete(&self, state: Self::Model) -> Response<Self::Model>;

    /// Adopt an existing remote object by id. Only the id is set; the
    /// engine's next read fills in the rest.
    fn import_state(&self, id: &str) -> Response<Self::Model>;
}
