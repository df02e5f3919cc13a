//! HTTP client for the Zammad ticket priority API.
//!
//! [`TicketPriorityApi`] is the seam between the resource and the remote
//! system; [`ZammadClient`] implements it over the Zammad REST API and
//! `testing::MockTicketPriorityApi` implements it in memory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ProviderConfig;

const TICKET_PRIORITIES_PATH: &str = "api/v1/ticket_priorities";

/// A ticket priority as the Zammad API represents it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketPriority {
    /// Server-assigned identifier.
    pub id: i64,
    /// Display name.
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    /// Free-text note.
    #[serde(deserialize_with = "null_as_empty")]
    pub note: String,
    /// UI color class, e.g. `high-priority`.
    #[serde(deserialize_with = "null_as_empty")]
    pub ui_color: String,
    /// UI icon name, e.g. `important`.
    #[serde(deserialize_with = "null_as_empty")]
    pub ui_icon: String,
    /// Whether the priority can be selected.
    pub active: bool,
    /// Whether new tickets get this priority by default.
    pub default_create: bool,
    /// User that created the priority.
    pub created_by_id: i64,
    /// User that last updated the priority.
    pub updated_by_id: i64,
    /// Creation timestamp.
    #[serde(deserialize_with = "null_as_empty")]
    pub created_at: String,
    /// Last update timestamp.
    #[serde(deserialize_with = "null_as_empty")]
    pub updated_at: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The editable fields sent on create and update.
#[derive(Debug, Serialize)]
struct WriteBody<'a> {
    name: &'a str,
    note: &'a str,
    ui_color: &'a str,
    ui_icon: &'a str,
    active: bool,
    default_create: bool,
}

impl<'a> From<&'a TicketPriority> for WriteBody<'a> {
    fn from(tp: &'a TicketPriority) -> Self {
        Self {
            name: &tp.name,
            note: &tp.note,
            ui_color: &tp.ui_color,
            ui_icon: &tp.ui_icon,
            active: tp.active,
            default_create: tp.default_create,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    error_human: Option<String>,
}

/// Errors returned by [`TicketPriorityApi`] implementations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response not received.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No ticket priority with this id exists.
    #[error("ticket_priority {0} not found")]
    NotFound(i64),

    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message reported by Zammad, or the raw body.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL is unusable.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Operations on Zammad ticket priorities.
#[async_trait]
pub trait TicketPriorityApi: Send + Sync {
    /// Create a ticket priority from the editable fields of `tp`.
    async fn create_ticket_priority(
        &self,
        tp: &TicketPriority,
    ) -> Result<TicketPriority, ClientError>;

    /// Fetch a ticket priority by id.
    async fn get_ticket_priority(&self, id: i64) -> Result<TicketPriority, ClientError>;

    /// Update the ticket priority `tp.id` with the editable fields of `tp`.
    async fn update_ticket_priority(
        &self,
        tp: &TicketPriority,
    ) -> Result<TicketPriority, ClientError>;

    /// Delete a ticket priority by id.
    async fn delete_ticket_priority(&self, id: i64) -> Result<(), ClientError>;
}

/// Client handle shared between the provider and its resources.
pub type SharedClient = Arc<dyn TicketPriorityApi>;

/// [`TicketPriorityApi`] over the Zammad REST API.
pub struct ZammadClient {
    http: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for ZammadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZammadClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ZammadClient {
    /// Create a client for the configured instance.
    pub fn new(config: &ProviderConfig) -> Result<Self, ClientError> {
        let base_url = config.url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::InvalidUrl(config.url.clone()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("hemmer-provider-zammad/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, id: Option<i64>) -> String {
        match id {
            Some(id) => format!("{}/{}/{}", self.base_url, TICKET_PRIORITIES_PATH, id),
            None => format!("{}/{}", self.base_url, TICKET_PRIORITIES_PATH),
        }
    }

    fn request(&self, method: Method, id: Option<i64>) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(id))
            .header(reqwest::header::AUTHORIZATION, auth_header(&self.token))
    }

    async fn send(&self, request: RequestBuilder, id: Option<i64>) -> Result<String, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(error_from_response(status, &body, id))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        id: Option<i64>,
    ) -> Result<T, ClientError> {
        let body = self.send(request, id).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TicketPriorityApi for ZammadClient {
    async fn create_ticket_priority(
        &self,
        tp: &TicketPriority,
    ) -> Result<TicketPriority, ClientError> {
        debug!(name = %tp.name, "POST ticket_priorities");
        let request = self
            .request(Method::POST, None)
            .json(&WriteBody::from(tp));
        self.send_json(request, None).await
    }

    async fn get_ticket_priority(&self, id: i64) -> Result<TicketPriority, ClientError> {
        debug!(id, "GET ticket_priorities");
        let request = self.request(Method::GET, Some(id));
        self.send_json(request, Some(id)).await
    }

    async fn update_ticket_priority(
        &self,
        tp: &TicketPriority,
    ) -> Result<TicketPriority, ClientError> {
        debug!(id = tp.id, "PUT ticket_priorities");
        let request = self
            .request(Method::PUT, Some(tp.id))
            .json(&WriteBody::from(tp));
        self.send_json(request, Some(tp.id)).await
    }

    async fn delete_ticket_priority(&self, id: i64) -> Result<(), ClientError> {
        debug!(id, "DELETE ticket_priorities");
        let request = self.request(Method::DELETE, Some(id));
        self.send(request, Some(id)).await.map(|_| ())
    }
}

fn auth_header(token: &str) -> String {
    format!("Token token={}", token)
}

/// Map a non-success response to a [`ClientError`].
fn error_from_response(status: StatusCode, body: &str, id: Option<i64>) -> ClientError {
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return ClientError::NotFound(id);
        }
    }
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_human
        .or(parsed.error)
        .unwrap_or_else(|| body.chars().take(200).collect());
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
