//! Error types for the Zammad provider.

use std::num::ParseIntError;

use thiserror::Error;

use crate::client::ClientError;
use crate::schema::Diagnostic;

/// Errors returned to the engine.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request from the engine.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The operation produced error diagnostics.
    #[error("{}", join_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
}

impl ProviderError {
    /// Diagnostics describing this error.
    ///
    /// [`ProviderError::Diagnostics`] yields its diagnostics unchanged; every
    /// other variant becomes a single error diagnostic.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            Self::Diagnostics(diags) => diags,
            other => vec![Diagnostic::error(other.to_string())],
        }
    }
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures of a single resource operation.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The id stored in state is not an integer.
    #[error("Could not convert id {id}: {source}")]
    InvalidId {
        /// The id as found in state.
        id: String,
        /// Why parsing failed.
        source: ParseIntError,
    },

    /// The API client returned an error.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// No client has been bound to the resource yet.
    #[error("Expected a configured Zammad client. Please report this issue to the provider developers.")]
    Unconfigured,
}

impl ResourceError {
    /// Build an error diagnostic with the given summary.
    pub fn to_diagnostic(&self, summary: impl Into<String>) -> Diagnostic {
        Diagnostic::error(summary).with_detail(self.to_string())
    }

    /// Like [`ResourceError::to_diagnostic`], with `context` leading the detail.
    pub fn to_diagnostic_in(
        &self,
        summary: impl Into<String>,
        context: impl std::fmt::Display,
    ) -> Diagnostic {
        Diagnostic::error(summary).with_detail(format!("{}: {}", context, self))
    }
}

/// Parse a state id into the integer id the API expects.
pub fn parse_id(id: &str) -> Result<i64, ResourceError> {
    id.parse::<i64>().map_err(|source| ResourceError::InvalidId {
        id: id.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("ticket_priority 7".to_string());
        assert_eq!(format!("{}", err), "Resource not found: ticket_priority 7");

        let err = ProviderError::UnknownResource("zammad_ticket_state".to_string());
        assert_eq!(
            format!("{}", err),
            "Unknown resource type: zammad_ticket_state"
        );
    }

    #[test]
    fn test_diagnostics_display_joins_entries() {
        let err = ProviderError::Diagnostics(vec![
            Diagnostic::error("Error reading ID").with_detail("bad id"),
            Diagnostic::error("Second"),
        ]);
        assert_eq!(err.to_string(), "Error reading ID: bad id; Second");
    }

    #[test]
    fn test_into_diagnostics() {
        let diags = ProviderError::Validation("bad".to_string()).into_diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert_eq!(diags[0].summary, "Validation error: bad");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);

        let err = parse_id("abc").unwrap_err();
        assert!(matches!(err, ResourceError::InvalidId { ref id, .. } if id == "abc"));
        assert!(err.to_string().starts_with("Could not convert id abc: "));

        assert!(parse_id("").is_err());
    }

    #[test]
    fn test_resource_error_to_diagnostic() {
        let diag = parse_id("x")
            .unwrap_err()
            .to_diagnostic("Error reading ID");
        assert!(diag.is_error());
        assert_eq!(diag.summary, "Error reading ID");
        assert!(diag.detail.unwrap().contains("Could not convert id x"));
    }

    #[test]
    fn test_client_error_diagnostic_keeps_message() {
        let err = ResourceError::from(ClientError::NotFound(9));
        assert!(matches!(err, ResourceError::Client(ClientError::NotFound(9))));

        let diag = err.to_diagnostic_in(
            "Error reading ticket_priority",
            "Could not read ticket_priority 9",
        );
        assert_eq!(diag.summary, "Error reading ticket_priority");
        assert_eq!(
            diag.detail.as_deref(),
            Some("Could not read ticket_priority 9: ticket_priority 9 not found")
        );
    }
}
