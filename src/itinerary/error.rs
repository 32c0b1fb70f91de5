use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Failure kinds surfaced by the itinerary core.
///
/// The first five are caller errors and stay distinct all the way to the
/// transport, even where HTTP status codes coincide.
#[derive(Debug, Error)]
pub enum ItineraryError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Itinerary not found: {0}")]
    NotFound(String),

    #[error("Index {index} is out of range for '{path}' (length {len})")]
    InvalidIndex { path: String, index: usize, len: usize },

    #[error("Validation error: {message}")]
    Validation { field: Option<String>, message: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Day generator failed: {0}")]
    Upstream(String),
}

impl ItineraryError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ItineraryError::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        ItineraryError::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn not_found(id: impl std::fmt::Display) -> Self {
        ItineraryError::NotFound(id.to_string())
    }

    pub fn invalid_index(path: impl Into<String>, index: usize, len: usize) -> Self {
        ItineraryError::InvalidIndex {
            path: path.into(),
            index,
            len,
        }
    }
}
