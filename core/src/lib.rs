pub mod client;
pub mod config;
pub mod controller;
pub mod model;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiError, HttpTaskClient, TaskApi, CONNECT_ERROR_MESSAGE};
pub use config::{ApiConfig, ConfigError, ConfigOverrides, FileConfig, DEFAULT_BASE_URL};
pub use controller::{
    ActionError, ActionRejected, Counts, CreateController, EditController, FormState, ListController,
    RefreshTicket, Rejected, SubmitOutcome,
};
pub use model::task::{NewTask, Status, Task, TaskId, TaskPatch};
pub use validation::{check_title, validate, FormErrors, FormField, ValidationError, MIN_TITLE_LEN};
