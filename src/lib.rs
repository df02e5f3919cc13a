//! Hemmer provider for Zammad
//!
//! Manages Zammad helpdesk objects as Hemmer resources. The provider exposes
//! one resource type, `zammad_ticket_priority`, backed by the Zammad REST API.
//!
//! # Overview
//!
//! - **[`ProviderService`]**: the engine-facing trait, exchanging JSON documents
//! - **[`ZammadProvider`]**: dispatches engine calls to the resources
//! - **[`ticket_priority`]**: the ticket priority resource and its schema
//! - **[`client`]**: the Zammad API seam and its HTTP implementation
//! - **[`plan`] / [`validation`]**: schema-driven planning and config checks
//! - **[`testing`]**: a provider tester and an in-memory Zammad API
//!
//! # Quick Start
//!
//! ```no_run
//! use hemmer_provider_zammad::{init_logging, ProviderService, ZammadProvider};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), hemmer_provider_zammad::ProviderError> {
//! init_logging();
//!
//! let provider = ZammadProvider::new();
//! provider
//!     .configure(json!({"url": "https://helpdesk.example.com", "token": "secret"}))
//!     .await?;
//!
//! let plan = provider
//!     .plan("zammad_ticket_priority", None, json!(null), json!({"name": "Urgent"}))
//!     .await?;
//! let state = provider
//!     .create("zammad_ticket_priority", plan.planned_state)
//!     .await?;
//! println!("created ticket priority {}", state["id"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Values
//!
//! Plan and state documents are JSON objects keyed by attribute name. A null
//! or absent attribute is unset. A value not known until apply is the string
//! [`value::UNKNOWN_VALUE`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod service;
pub mod testing;
pub mod ticket_priority;
pub mod types;
pub mod validation;
pub mod value;

// Re-export main types at crate root
pub use client::{SharedClient, TicketPriorityApi, ZammadClient};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{ZammadProvider, PROVIDER_TYPE_NAME};
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
