use tracing::{debug, info, warn};

use crate::client::{ApiError, TaskApi};
use crate::controller::form::{Draft, FormState, Rejected, SubmitOutcome};
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::validation::FormErrors;

/// Edit session for a single task, shown as a modal over the list.
#[derive(Debug)]
pub struct EditController {
    id: TaskId,
    state: FormState,
}

impl EditController {
    /// Opens the form pre-filled with the task's current title and description.
    pub fn open(task: &Task) -> Self {
        debug!(id = task.id, "opening editor");
        Self {
            id: task.id,
            state: FormState::Editing(Draft::new(task.title.clone(), task.description_or_empty())),
        }
    }

    /// Opens the form with empty fields, for when no snapshot of the task is at hand.
    pub fn blank(id: TaskId) -> Self {
        Self {
            id,
            state: FormState::Idle,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
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

    /// The modal cannot be dismissed while its request is outstanding.
    pub fn can_close(&self) -> bool {
        !self.state.is_submitting()
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        self.state.set_title(title)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> bool {
        self.state.set_description(description)
    }

    pub fn begin_submit(&mut self) -> Result<TaskPatch, Rejected> {
        let (title, description) = self.state.begin_submit()?;
        Ok(TaskPatch::fields(title, description))
    }

    /// On success the caller closes the modal and refetches the list.
    pub fn finish_submit(&mut self, result: Result<(), ApiError>) -> SubmitOutcome<TaskId> {
        if !self.state.finish_submit(result.as_ref().copied()) {
            debug!(id = self.id, "update answer arrived with no submit outstanding");
            return SubmitOutcome::Ignored;
        }
        match result {
            Ok(()) => {
                info!(id = self.id, "task updated");
                SubmitOutcome::Done(self.id)
            }
            Err(err) => {
                warn!(id = self.id, error = %err, "update failed");
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn submit(&mut self, api: &dyn TaskApi) -> SubmitOutcome<TaskId> {
        let patch = match self.begin_submit() {
            Ok(patch) => patch,
            Err(rejected) => return SubmitOutcome::Rejected(rejected),
        };
        let result = api.update(self.id, &patch).await;
        self.finish_submit(result)
    }
}
