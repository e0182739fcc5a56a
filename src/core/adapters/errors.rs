use crate::core::models::ext::{ExtDecodeError, ExtStage};
use strum::Display;
use thiserror::Error;

/// Coarse classification an orchestrator can branch on without
/// matching every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    MalformedExtension,
    Serialization,
    BadInput,
    BadServerResponse,
    Transport,
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("imp {imp_id}: invalid bidder ext ({stage}): {reason}")]
    MalformedExtension {
        imp_id: String,
        stage: ExtStage,
        reason: String,
    },

    #[error("imp {imp_id}: failed to encode request: {source}")]
    Serialization {
        imp_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{message}")]
    BadInput { message: String },

    #[error("{message}")]
    BadServerResponse { message: String },

    #[error("callout to {uri} failed: {source}")]
    Transport {
        uri: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AdapterError {
    pub fn malformed_ext(imp_id: &str, err: ExtDecodeError) -> Self {
        AdapterError::MalformedExtension {
            imp_id: imp_id.to_string(),
            stage: err.stage,
            reason: err.reason,
        }
    }

    pub fn unexpected_status(status_code: u16) -> Self {
        let message = format!(
            "Unexpected status code: {}. Run with request.debug = 1 for more info",
            status_code
        );

        match status_code {
            400 => AdapterError::BadInput { message },
            _ => AdapterError::BadServerResponse { message },
        }
    }

    pub fn unknown_imp(imp_id: &str) -> Self {
        AdapterError::BadInput {
            message: format!("Failed to find impression \"{}\"", imp_id),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::MalformedExtension { .. } => ErrorKind::MalformedExtension,
            AdapterError::Serialization { .. } => ErrorKind::Serialization,
            AdapterError::BadInput { .. } => ErrorKind::BadInput,
            AdapterError::BadServerResponse { .. } => ErrorKind::BadServerResponse,
            AdapterError::Transport { .. } => ErrorKind::Transport,
        }
    }
}
