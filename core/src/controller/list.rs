//! The task list panel: owns the local snapshot and the single edit session.
//!
//! Mutations are serialized per task id: while a toggle or delete for a task
//! is outstanding, further actions on that task are refused. Refetches carry
//! a generation number and only the newest issued refetch may replace the
//! snapshot, so a slow stale answer never overwrites a fresher one.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};

use crate::client::{ApiError, TaskApi};
use crate::controller::edit::EditController;
use crate::model::task::{Status, Task, TaskId, TaskPatch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ActionRejected {
    #[error("Task {0} is not in the list")]
    UnknownTask(TaskId),

    #[error("Task {0} is still being saved")]
    Busy(TaskId),

    #[error("Another task is already being edited")]
    EditorOpen,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error(transparent)]
    Rejected(#[from] ActionRejected),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Handle for one issued refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

#[derive(Debug, Default)]
pub struct ListController {
    tasks: Vec<Task>,
    in_flight: HashSet<TaskId>,
    issued: u64,
    applied: u64,
    editor: Option<EditController>,
    notice: Option<String>,
}

impl ListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Derived from the snapshot on every call.
    pub fn counts(&self) -> Counts {
        let completed = self.tasks.iter().filter(|t| t.status == Status::Completed).count();
        let pending = self.tasks.iter().filter(|t| t.status == Status::Pending).count();
        Counts { completed, pending }
    }

    pub fn is_busy(&self, id: TaskId) -> bool {
        self.in_flight.contains(&id)
    }

    /// Last list-level message, e.g. a failed delete.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    // Refetch

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Replaces the snapshot unless a newer refetch has already been applied.
    /// A failed fetch shows an empty list. A successful one clears the notice.
    pub fn finish_refresh(&mut self, ticket: RefreshTicket, result: Result<Vec<Task>, ApiError>) -> bool {
        if ticket.0 <= self.applied {
            debug!(ticket = ticket.0, applied = self.applied, "dropping stale task list");
            return false;
        }
        self.applied = ticket.0;
        self.tasks = match result {
            Ok(tasks) => {
                self.notice = None;
                tasks
            }
            Err(err) => {
                warn!(error = %err, "could not fetch tasks, showing an empty list");
                Vec::new()
            }
        };
        true
    }

    pub async fn refresh(&mut self, api: &dyn TaskApi) {
        let ticket = self.begin_refresh();
        let result = api.list().await;
        self.finish_refresh(ticket, result);
    }

    // Status toggle

    /// Locks the task and returns the status to send.
    pub fn begin_toggle(&mut self, id: TaskId) -> Result<Status, ActionRejected> {
        let status = self.task(id).ok_or(ActionRejected::UnknownTask(id))?.status.toggled();
        self.lock(id)?;
        Ok(status)
    }

    /// Patches only that task's status, and only once the service agreed.
    pub fn finish_toggle(&mut self, id: TaskId, status: Status, result: Result<(), ApiError>) -> Result<(), ApiError> {
        self.in_flight.remove(&id);
        match result {
            Ok(()) => {
                match self.tasks.iter_mut().find(|t| t.id == id) {
                    Some(task) => task.status = status,
                    None => debug!(id, "toggled task is no longer listed"),
                }
                Ok(())
            }
            Err(err) => {
                warn!(id, error = %err, "status change failed, keeping previous status");
                self.notice = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn toggle(&mut self, api: &dyn TaskApi, id: TaskId) -> Result<Status, ActionError> {
        let status = self.begin_toggle(id)?;
        let result = api.update(id, &TaskPatch::status(status)).await;
        self.finish_toggle(id, status, result)?;
        Ok(status)
    }

    // Delete

    pub fn begin_delete(&mut self, id: TaskId) -> Result<(), ActionRejected> {
        if self.task(id).is_none() {
            return Err(ActionRejected::UnknownTask(id));
        }
        self.lock(id)
    }

    /// A failed delete is surfaced and leaves the list as it is. After a
    /// successful one the caller refetches.
    pub fn finish_delete(&mut self, id: TaskId, result: Result<(), ApiError>) -> Result<(), ApiError> {
        self.in_flight.remove(&id);
        if let Err(err) = &result {
            warn!(id, error = %err, "delete failed");
            self.notice = Some(err.user_message());
        }
        result
    }

    pub async fn delete(&mut self, api: &dyn TaskApi, id: TaskId) -> Result<(), ActionError> {
        self.begin_delete(id)?;
        let result = api.remove(id).await;
        self.finish_delete(id, result)?;
        self.refresh(api).await;
        Ok(())
    }

    // Edit session

    pub fn open_editor(&mut self, id: TaskId) -> Result<&mut EditController, ActionRejected> {
        if self.editor.is_some() {
            return Err(ActionRejected::EditorOpen);
        }
        let task = self.task(id).ok_or(ActionRejected::UnknownTask(id))?;
        let editor = EditController::open(task);
        Ok(self.editor.insert(editor))
    }

    pub fn editor(&self) -> Option<&EditController> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditController> {
        self.editor.as_mut()
    }

    /// Dismisses the modal. Refused while its update is outstanding.
    pub fn close_editor(&mut self) -> bool {
        if self.editor.as_ref().is_some_and(|editor| !editor.can_close()) {
            return false;
        }
        self.editor = None;
        true
    }

    fn lock(&mut self, id: TaskId) -> Result<(), ActionRejected> {
        if !self.in_flight.insert(id) {
            return Err(ActionRejected::Busy(id));
        }
        Ok(())
    }
}
