use async_trait::async_trait;
use thiserror::Error;

use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::validation::{FormErrors, FormField};

pub const CONNECT_ERROR_MESSAGE: &str = "Cannot connect to the server";

/// Failures a call against the todo service can end in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The service rejected one input field.
    #[error("{field}: {message}")]
    Field { field: FormField, message: String },

    /// The service rejected the request as a whole.
    #[error("{0}")]
    General(String),

    /// The request never completed: refused, timed out, or cut off.
    #[error("Cannot connect to the server: {0}")]
    Network(String),
}

impl ApiError {
    /// Text meant for the person at the keyboard. Transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Field { message, .. } | ApiError::General(message) => message.clone(),
            ApiError::Network(_) => CONNECT_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<&ApiError> for FormErrors {
    fn from(err: &ApiError) -> Self {
        let mut errors = FormErrors::new();
        match err {
            ApiError::Field { field, message } => errors.set_field(*field, message.clone()),
            other => errors.set_general(other.user_message()),
        }
        errors
    }
}

/// The remote task collection.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Malformed payloads come back as an empty list; only transport failures are errors.
    async fn list(&self) -> Result<Vec<Task>, ApiError>;

    /// The service may answer a successful create without a body.
    async fn create(&self, task: &NewTask) -> Result<Option<Task>, ApiError>;

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<(), ApiError>;

    async fn remove(&self, id: TaskId) -> Result<(), ApiError>;
}
