use thiserror::Error;

/// Failures reported by the persistence and blob boundaries.
///
/// Messages carried here are backend detail and go to the log; what the user
/// sees comes from [`StoreError::user_message`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Query failed on '{collection}': {message}")]
    Query { collection: String, message: String },

    #[error("Write failed on '{collection}': {message}")]
    Write { collection: String, message: String },

    #[error("Uniqueness violated on '{collection}': {message}")]
    ConstraintViolation { collection: String, message: String },

    #[error("Procedure '{procedure}' failed: {message}")]
    Procedure { procedure: String, message: String },

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Backend unavailable: {0}")]
    Connection(String),
}

impl StoreError {
    pub fn query(collection: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Query { collection: collection.into(), message: message.into() }
    }

    pub fn write(collection: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Write { collection: collection.into(), message: message.into() }
    }

    pub fn constraint(collection: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::ConstraintViolation { collection: collection.into(), message: message.into() }
    }

    pub fn procedure(procedure: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Procedure { procedure: procedure.into(), message: message.into() }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation { .. })
    }

    /// Text shown to the editor
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Query { .. } => "Failed to load data.".to_string(),
            // Outside the team path a uniqueness violation is just a failed save
            StoreError::Write { .. } | StoreError::ConstraintViolation { .. } => {
                "Saving failed. Your changes were kept, please try again.".to_string()
            }
            StoreError::Procedure { .. } => "The operation could not be completed.".to_string(),
            StoreError::Upload(_) => "Image upload failed.".to_string(),
            StoreError::InvalidIdentifier(name) => format!("Unknown field or collection '{}'.", name),
            StoreError::Connection(_) => "The backend is unavailable.".to_string(),
        }
    }
}
