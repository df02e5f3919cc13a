//! The `zammad_ticket_priority` resource.
//!
//! Ticket priorities are small: a required name, three optional styling
//! fields, two booleans and a handful of server-assigned audit fields. The
//! only subtle part is the optional strings. Zammad reports an unset `note`,
//! `ui_icon` or `ui_color` as `""`, so the resource keeps such a field null
//! when it was null before the call and the server answered `""`. Create and
//! update decide from the plan; read decides from the prior state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::client::{SharedClient, TicketPriority};
use crate::error::{parse_id, ResourceError};
use crate::resource::{Resource, Response};
use crate::schema::{Attribute, PlanModifier, Schema};
use crate::value::AttrValue;

/// Suffix appended to the provider type name.
pub const TYPE_NAME_SUFFIX: &str = "_ticket_priority";

/// Plan and state model of a ticket priority.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketPriorityModel {
    /// Server-assigned id, numeric in the API.
    pub id: AttrValue<String>,
    /// Display name.
    pub name: AttrValue<String>,
    /// Free-text note.
    pub note: AttrValue<String>,
    /// UI icon name.
    pub ui_icon: AttrValue<String>,
    /// UI color class.
    pub ui_color: AttrValue<String>,
    /// Whether new tickets get this priority by default.
    pub default_create: AttrValue<bool>,
    /// Whether the priority can be selected.
    pub active: AttrValue<bool>,
    /// User that created the priority.
    pub created_by_id: AttrValue<i64>,
    /// User that last updated the priority.
    pub updated_by_id: AttrValue<i64>,
    /// Creation timestamp.
    pub created_at: AttrValue<String>,
    /// Last update timestamp.
    pub updated_at: AttrValue<String>,
}

impl TicketPriorityModel {
    /// A model holding only an id, as produced by import.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: AttrValue::Known(id.into()),
            ..Default::default()
        }
    }

    /// API request carrying this model's editable fields.
    pub fn to_request(&self, id: i64) -> TicketPriority {
        TicketPriority {
            id,
            name: self.name.value_or_default(),
            note: self.note.value_or_default(),
            ui_color: self.ui_color.value_or_default(),
            ui_icon: self.ui_icon.value_or_default(),
            active: self.active.value_or_default(),
            default_create: self.default_create.value_or_default(),
            ..Default::default()
        }
    }

    /// State built from a create or update response, with `plan` deciding
    /// whether empty optional fields stay null.
    pub fn from_response(tp: TicketPriority, plan: &Self) -> Self {
        Self {
            id: AttrValue::Known(tp.id.to_string()),
            name: AttrValue::Known(tp.name),
            note: reconcile_optional(&plan.note, tp.note),
            ui_icon: reconcile_optional(&plan.ui_icon, tp.ui_icon),
            ui_color: reconcile_optional(&plan.ui_color, tp.ui_color),
            default_create: AttrValue::Known(tp.default_create),
            active: AttrValue::Known(tp.active),
            created_by_id: AttrValue::Known(tp.created_by_id),
            updated_by_id: AttrValue::Known(tp.updated_by_id),
            created_at: AttrValue::Known(tp.created_at),
            updated_at: AttrValue::Known(tp.updated_at),
        }
    }

    /// Overwrite everything but the id from a read response, with the
    /// current state deciding whether empty optional fields stay null.
    pub fn refresh(&mut self, tp: TicketPriority) {
        self.name = AttrValue::Known(tp.name);
        self.note = reconcile_optional(&self.note, tp.note);
        self.ui_icon = reconcile_optional(&self.ui_icon, tp.ui_icon);
        self.ui_color = reconcile_optional(&self.ui_color, tp.ui_color);
        self.default_create = AttrValue::Known(tp.default_create);
        self.active = AttrValue::Known(tp.active);
        self.created_by_id = AttrValue::Known(tp.created_by_id);
        self.updated_by_id = AttrValue::Known(tp.updated_by_id);
        self.created_at = AttrValue::Known(tp.created_at);
        self.updated_at = AttrValue::Known(tp.updated_at);
    }

    fn id_str(&self) -> &str {
        self.id.value().map(String::as_str).unwrap_or_default()
    }
}

/// Null stays null when the server reports the field empty; anything else
/// is taken verbatim from the server.
pub fn reconcile_optional(prior: &AttrValue<String>, server: String) -> AttrValue<String> {
    if prior.is_null() && server.is_empty() {
        AttrValue::Null
    } else {
        AttrValue::Known(server)
    }
}

/// Schema of `zammad_ticket_priority`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_attribute(
            "id",
            Attribute::computed_string()
                .with_description("Identifier of the ticket priority.")
                .use_state_for_unknown(),
        )
        .with_attribute(
            "name",
            Attribute::required_string().with_description("Name of the ticket priority."),
        )
        .with_attribute(
            "note",
            Attribute::optional_string().with_description("Free-text note."),
        )
        .with_attribute(
            "ui_icon",
            Attribute::optional_string().with_description("Icon shown next to the priority."),
        )
        .with_attribute(
            "ui_color",
            Attribute::optional_string().with_description("Color class of the priority."),
        )
        .with_attribute(
            "default_create",
            Attribute::optional_computed_bool()
                .with_description("Whether new tickets get this priority by default.")
                .use_state_for_unknown(),
        )
        .with_attribute(
            "active",
            Attribute::optional_computed_bool()
                .with_description("Whether the priority can be selected.")
                .with_plan_modifier(PlanModifier::DefaultBool(true))
                .use_state_for_unknown(),
        )
        .with_attribute(
            "created_by_id",
            Attribute::computed_int64().use_state_for_unknown(),
        )
        .with_attribute(
            "updated_by_id",
            Attribute::computed_int64().use_state_for_unknown(),
        )
        .with_attribute(
            "created_at",
            Attribute::computed_string().use_state_for_unknown(),
        )
        .with_attribute(
            "updated_at",
            Attribute::computed_string().use_state_for_unknown(),
        )
}

/// Manages Zammad ticket priorities.
#[derive(Default)]
pub struct TicketPriorityResource {
    client: Option<SharedClient>,
}

impl std::fmt::Debug for TicketPriorityResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketPriorityResource")
            .field("configured", &self.client.is_some())
            .finish()
    }
}

impl TicketPriorityResource {
    /// An unconfigured resource; bind a client with [`Resource::configure`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource bound to `client`.
    pub fn with_client(client: SharedClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Whether a client is bound.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&SharedClient, ResourceError> {
        self.client.as_ref().ok_or(ResourceError::Unconfigured)
    }
}

#[async_trait]
impl Resource for TicketPriorityResource {
    type Model = TicketPriorityModel;

    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{}{}", provider_type_name, TYPE_NAME_SUFFIX)
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, provider_data: Option<SharedClient>) {
        if let Some(client) = provider_data {
            self.client = Some(client);
        }
    }

    #[instrument(skip(self, plan), name = "ticket_priority.create")]
    async fn create(&self, plan: TicketPriorityModel) -> Response<TicketPriorityModel> {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => return Response::failed(None, e.to_diagnostic("Unconfigured client")),
        };

        let request = plan.to_request(0);
        match client.create_ticket_priority(&request).await {
            Ok(tp) => {
                info!(id = tp.id, name = %tp.name, "Created ticket_priority");
                Response::ok(TicketPriorityModel::from_response(tp, &plan))
            },
            Err(e) => {
                let e = ResourceError::from(e);
                error!(error = %e, "Create ticket_priority failed");
                Response::failed(
                    None,
                    e.to_diagnostic_in(
                        "Error creating ticket_priority",
                        "Could not create ticket_priority, unexpected error",
                    ),
                )
            },
        }
    }

    #[instrument(skip(self, state), fields(id = %state.id_str()), name = "ticket_priority.read")]
    async fn read(&self, mut state: TicketPriorityModel) -> Response<TicketPriorityModel> {
        let id = match parse_id(state.id_str()) {
            Ok(id) => id,
            Err(e) => {
                let diagnostic = e.to_diagnostic("Error reading ID");
                return Response::failed(Some(state), diagnostic);
            },
        };
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                let diagnostic = e.to_diagnostic("Unconfigured client");
                return Response::failed(Some(state), diagnostic);
            },
        };

        match client.get_ticket_priority(id).await {
            Ok(tp) => {
                debug!(id, "Refreshed ticket_priority");
                state.refresh(tp);
                Response::ok(state)
            },
            Err(e) => {
                let e = ResourceError::from(e);
                error!(id, error = %e, "Read ticket_priority failed");
                let diagnostic = e.to_diagnostic_in(
                    "Error reading ticket_priority",
                    format!("Could not read ticket_priority {}", state.id_str()),
                );
                Response::failed(Some(state), diagnostic)
            },
        }
    }

    #[instrument(skip(self, plan, state), fields(id = %state.id_str()), name = "ticket_priority.update")]
    async fn update(
        &self,
        plan: TicketPriorityModel,
        state: TicketPriorityModel,
    ) -> Response<TicketPriorityModel> {
        let id = match parse_id(state.id_str()) {
            Ok(id) => id,
            Err(e) => return Response::failed(None, e.to_diagnostic("Error reading ID")),
        };
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => return Response::failed(None, e.to_diagnostic("Unconfigured client")),
        };

        let request = plan.to_request(id);
        match client.update_ticket_priority(&request).await {
            Ok(tp) => {
                info!(id, name = %tp.name, "Updated ticket_priority");
                Response::ok(TicketPriorityModel::from_response(tp, &plan))
            },
            Err(e) => {
                let e = ResourceError::from(e);
                error!(id, error = %e, "Update ticket_priority failed");
                Response::failed(
                    None,
                    e.to_diagnostic_in(
                        "Error updating ticket_priority",
                        format!("Could not update ticket_priority {}", state.id_str()),
                    ),
                )
            },
        }
    }

    #[instrument(skip(self, state), fields(id = %state.id_str()), name = "ticket_priority.delete")]
    async fn delete(&self, state: TicketPriorityModel) -> Response<TicketPriorityModel> {
        let id = match parse_id(state.id_str()) {
            Ok(id) => id,
            Err(e) => return Response::failed(None, e.to_diagnostic("Error reading ID")),
        };
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => return Response::failed(None, e.to_diagnostic("Unconfigured client")),
        };

        match client.delete_ticket_priority(id).await {
            Ok(()) => {
                info!(id, "Deleted ticket_priority");
                Response::removed()
            },
            Err(e) => {
                let e = ResourceError::from(e);
                error!(id, error = %e, "Delete ticket_priority failed");
                Response::failed(
                    None,
                    e.to_diagnostic_in(
                        "Error deleting ticket_priority",
                        format!("Could not delete ticket_priority {}", state.id_str()),
                    ),
                )
            },
        }
    }

    fn import_state(&self, id: &str) -> Response<TicketPriorityModel> {
        debug!(id, "Importing ticket_priority");
        Response::ok(TicketPriorityModel::with_id(id))
    }
}
