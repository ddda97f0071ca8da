//! One-shot commands that reuse the same controllers as the TUI.

use anyhow::{anyhow, bail, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use todoboard_core::{
    CreateController, EditController, FormErrors, ListController, SubmitOutcome, Task, TaskApi, TaskId,
};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: TaskId,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Task")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            status: task.status.to_string(),
            title: task.title.clone(),
            description: task.description_or_empty().to_string(),
        }
    }
}

/// Joins the messages a form is showing into one line.
fn describe(errors: Option<&FormErrors>) -> String {
    let Some(errors) = errors else {
        return "Request was not sent".to_string();
    };
    let mut parts = Vec::new();
    if let Some(message) = errors.title() {
        parts.push(format!("title: {}", message));
    }
    if let Some(message) = errors.general() {
        parts.push(message.to_string());
    }
    parts.join("; ")
}

/// Fetches the list, failing loudly when the service cannot be reached.
async fn load(api: &dyn TaskApi) -> Result<ListController> {
    let tasks = api.list().await?;
    let mut list = ListController::new();
    let ticket = list.begin_refresh();
    list.finish_refresh(ticket, Ok(tasks));
    Ok(list)
}

pub async fn list(api: &dyn TaskApi) -> Result<()> {
    let mut list = ListController::new();
    list.refresh(api).await;

    if list.tasks().is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let rows: Vec<TaskRow> = list.tasks().iter().map(TaskRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    let counts = list.counts();
    println!("Completed: {}  Pending: {}", counts.completed, counts.pending);
    Ok(())
}

pub async fn add(api: &dyn TaskApi, title: String, description: String) -> Result<()> {
    let mut form = CreateController::new();
    form.set_title(title);
    form.set_description(description);

    match form.submit(api).await {
        SubmitOutcome::Done(Some(task)) => println!("Task added: {} (ID: {})", task.title, task.id),
        SubmitOutcome::Done(None) => println!("Task added."),
        _ => bail!(describe(form.errors())),
    }
    Ok(())
}

pub async fn edit(api: &dyn TaskApi, id: TaskId, title: Option<String>, description: Option<String>) -> Result<()> {
    let list = load(api).await?;
    let task = list.task(id).ok_or_else(|| anyhow!("Task {} not found", id))?;

    let mut editor = EditController::open(task);
    if let Some(title) = title {
        editor.set_title(title);
    }
    if let Some(description) = description {
        editor.set_description(description);
    }

    match editor.submit(api).await {
        SubmitOutcome::Done(id) => println!("Task {} updated.", id),
        _ => bail!(describe(editor.errors())),
    }
    Ok(())
}

pub async fn toggle(api: &dyn TaskApi, id: TaskId) -> Result<()> {
    let mut list = load(api).await?;
    let status = list.toggle(api, id).await?;
    println!("Task {} is now {}.", id, status);
    Ok(())
}

pub async fn remove(api: &dyn TaskApi, id: TaskId) -> Result<()> {
    let mut list = load(api).await?;
    list.delete(api, id).await?;
    println!("Task {} deleted.", id);
    Ok(())
}
