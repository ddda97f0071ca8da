//! In-memory stand-in for the todo service, used by controller tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{ApiError, TaskApi};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};

pub(crate) struct FakeApi {
    tasks: Mutex<Vec<Task>>,
    failure: Mutex<Option<ApiError>>,
    calls: Mutex<usize>,
}

impl FakeApi {
    pub(crate) fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            failure: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    /// The next call of any kind fails with `err`.
    pub(crate) fn fail_next(&self, err: ApiError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub(crate) fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub(crate) fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    fn record(&self) -> Result<(), ApiError> {
        *self.calls.lock().unwrap() += 1;
        match self.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found(id: TaskId) -> ApiError {
    ApiError::General(format!("task {} not found", id))
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        self.record()?;
        Ok(self.tasks())
    }

    async fn create(&self, task: &NewTask) -> Result<Option<Task>, ApiError> {
        self.record()?;
        let mut tasks = self.tasks.lock().unwrap();
        let id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let created = Task::new(id, task.title.clone()).with_description(task.description.clone());
        tasks.push(created.clone());
        Ok(Some(created))
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<(), ApiError> {
        self.record()?;
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.iter_mut().find(|t| t.id == id).ok_or_else(|| not_found(id))?;
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        Ok(())
    }

    async fn remove(&self, id: TaskId) -> Result<(), ApiError> {
        self.record()?;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}
