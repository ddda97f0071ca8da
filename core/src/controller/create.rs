use tracing::{debug, info, warn};

use crate::client::{ApiError, TaskApi};
use crate::controller::form::{FormState, Rejected, SubmitOutcome};
use crate::model::task::{NewTask, Task};
use crate::validation::FormErrors;

/// The "add task" form. Fields always start empty.
#[derive(Debug, Default)]
pub struct CreateController {
    state: FormState,
}

impl CreateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn title(&self) -> &str {
        self.state.title()
    }

    pub fn description(&self) -> &str {
        self.state.description()
    }

    pub fn errors(&self) -> Option<&FormErrors> {
        self.state.errors()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        self.state.set_title(title)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> bool {
        self.state.set_description(description)
    }

    /// Validates and locks the form. The returned body is what to POST.
    pub fn begin_submit(&mut self) -> Result<NewTask, Rejected> {
        let (title, description) = self.state.begin_submit()?;
        Ok(NewTask { title, description })
    }

    /// On success the form is emptied and the caller should refetch the list.
    pub fn finish_submit(&mut self, result: Result<Option<Task>, ApiError>) -> SubmitOutcome<Option<Task>> {
        if !self.state.finish_submit(result.as_ref().map(|_| ())) {
            debug!("create answer arrived with no submit outstanding");
            return SubmitOutcome::Ignored;
        }
        match result {
            Ok(created) => {
                info!(id = ?created.as_ref().map(|t| t.id), "task created");
                SubmitOutcome::Done(created)
            }
            Err(err) => {
                warn!(error = %err, "create failed");
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn submit(&mut self, api: &dyn TaskApi) -> SubmitOutcome<Option<Task>> {
        let body = match self.begin_submit() {
            Ok(body) => body,
            Err(rejected) => return SubmitOutcome::Rejected(rejected),
        };
        let result = api.create(&body).await;
        self.finish_submit(result)
    }
}
