//! Error types for the boundary server
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Resource ==
/// The two resource families served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Departments,
    Municipality,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Departments => f.write_str("Departments"),
            Resource::Municipality => f.write_str("Municipality"),
        }
    }
}

// == Boundary Error Enum ==
/// Unified error type for the boundary server.
#[derive(Error, Debug)]
pub enum BoundaryError {
    /// Dataset missing, corrupt, or not a readable GeoPackage
    #[error("Failed to open dataset {path}: {reason}")]
    DatasetOpen { path: String, reason: String },

    /// Iteration over the layer failed partway
    #[error("Failed to read layer: {0}")]
    LayerRead(String),

    /// Remote object storage could not deliver the dataset
    #[error("Remote storage unavailable{}: {reason}", status_suffix(.status))]
    RemoteUnavailable { status: Option<u16>, reason: String },

    /// No local file and no remote object for this key
    #[error("{resource} data not found")]
    NotFound { resource: Resource, key: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BoundaryError {
    /// Machine-readable error kind included in every error body.
    pub fn kind(&self) -> &'static str {
        match self {
            BoundaryError::DatasetOpen { .. } => "dataset_open",
            BoundaryError::LayerRead(_) => "layer_read",
            BoundaryError::RemoteUnavailable { .. } => "remote_unavailable",
            BoundaryError::NotFound { .. } => "not_found",
            BoundaryError::InvalidRequest(_) => "invalid_request",
            BoundaryError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BoundaryError::NotFound { .. } => StatusCode::NOT_FOUND,
            BoundaryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn dataset_open(path: &std::path::Path, reason: impl fmt::Display) -> Self {
        BoundaryError::DatasetOpen {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for BoundaryError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, details) = match &self {
            BoundaryError::NotFound { key, .. } => (
                self.to_string(),
                Some(format!("No local or remote source for key '{key}'")),
            ),
            BoundaryError::InvalidRequest(msg) => (msg.clone(), None),
            BoundaryError::DatasetOpen { .. } => {
                ("Failed to open dataset".to_string(), Some(self.to_string()))
            }
            BoundaryError::LayerRead(_) => (
                "Failed to read dataset layer".to_string(),
                Some(self.to_string()),
            ),
            BoundaryError::RemoteUnavailable { .. } => (
                "Remote data unavailable".to_string(),
                Some(self.to_string()),
            ),
            BoundaryError::Internal(_) => {
                ("Internal server error".to_string(), Some(self.to_string()))
            }
        };

        if status.is_server_error() {
            error!(kind = self.kind(), "{}", self);
        }

        let body = Json(ErrorResponse::new(message, self.kind(), details));
        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the boundary server.
pub type Result<T> = std::result::Result<T, BoundaryError>;
