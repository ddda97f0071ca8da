use std::future::Future;
use std::sync::Arc;

use ratatui::widgets::TableState;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use todoboard_core::{
    ApiError, CreateController, EditController, ListController, RefreshTicket, Status, Task,
    TaskApi, TaskId, TaskPatch,
};
use tracing::debug;

/// Answers from the service, delivered back to the UI loop.
#[derive(Debug)]
pub enum ApiEvent {
    Listed(RefreshTicket, Result<Vec<Task>, ApiError>),
    Toggled(TaskId, Status, Result<(), ApiError>),
    Deleted(TaskId, Result<(), ApiError>),
    Created(Result<Option<Task>, ApiError>),
    Updated(Result<(), ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
}

impl Field {
    fn other(self) -> Self {
        match self {
            Field::Title => Field::Description,
            Field::Description => Field::Title,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Create(Field),
    Edit(Field),
}

pub struct App {
    pub list: ListController,
    pub create: CreateController,
    pub table: TableState,
    pub focus: Focus,
    /// Short confirmation shown in the footer, e.g. after a task was added.
    pub flash: Option<String>,
    api: Arc<dyn TaskApi>,
    runtime: Handle,
    events: UnboundedSender<ApiEvent>,
}

impl App {
    pub fn new(api: Arc<dyn TaskApi>, runtime: Handle) -> (App, UnboundedReceiver<ApiEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let app = App {
            list: ListController::new(),
            create: CreateController::new(),
            table: TableState::default(),
            focus: Focus::List,
            flash: None,
            api,
            runtime,
            events,
        };
        (app, receiver)
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = ApiEvent> + Send + 'static,
    {
        let events = self.events.clone();
        self.runtime.spawn(async move {
            // The receiver is gone only when the UI has shut down.
            let _ = events.send(request.await);
        });
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.table.selected().and_then(|i| self.list.tasks().get(i))
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.selected_task().map(|t| t.id)
    }

    // Navigation

    pub fn next(&mut self) {
        let len = self.list.tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.list.tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table.select(Some(i));
    }

    fn clamp_selection(&mut self) {
        let len = self.list.tasks().len();
        match self.table.selected() {
            _ if len == 0 => self.table.select(None),
            Some(i) if i >= len => self.table.select(Some(len - 1)),
            None => self.table.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn focus_create(&mut self) {
        self.focus = Focus::Create(Field::Title);
    }

    pub fn focus_list(&mut self) {
        if !matches!(self.focus, Focus::Edit(_)) {
            self.focus = Focus::List;
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            Focus::List => Focus::Create(Field::Title),
            Focus::Create(field) => Focus::Create(field.other()),
            Focus::Edit(field) => Focus::Edit(field.other()),
        };
    }

    // List actions

    pub fn refresh(&mut self) {
        let ticket = self.list.begin_refresh();
        let api = Arc::clone(&self.api);
        self.spawn(async move { ApiEvent::Listed(ticket, api.list().await) });
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else { return };
        self.list.clear_notice();
        match self.list.begin_toggle(id) {
            Ok(status) => {
                let api = Arc::clone(&self.api);
                self.spawn(async move {
                    let result = api.update(id, &TaskPatch::status(status)).await;
                    ApiEvent::Toggled(id, status, result)
                });
            }
            Err(rejected) => self.flash = Some(rejected.to_string()),
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else { return };
        self.list.clear_notice();
        match self.list.begin_delete(id) {
            Ok(()) => {
                let api = Arc::clone(&self.api);
                self.spawn(async move { ApiEvent::Deleted(id, api.remove(id).await) });
            }
            Err(rejected) => self.flash = Some(rejected.to_string()),
        }
    }

    pub fn open_editor(&mut self) {
        let Some(id) = self.selected_id() else { return };
        match self.list.open_editor(id) {
            Ok(_) => self.focus = Focus::Edit(Field::Title),
            Err(rejected) => self.flash = Some(rejected.to_string()),
        }
    }

    pub fn close_editor(&mut self) {
        if self.list.close_editor() {
            self.focus = Focus::List;
        }
    }

    // Form input

    fn edit_focused(&mut self, change: impl FnOnce(&mut String)) {
        match self.focus {
            Focus::List => {}
            Focus::Create(field) => {
                let mut value = focused_value(field, self.create.title(), self.create.description());
                change(&mut value);
                match field {
                    Field::Title => self.create.set_title(value),
                    Field::Description => self.create.set_description(value),
                };
            }
            Focus::Edit(field) => {
                if let Some(editor) = self.list.editor_mut() {
                    apply_to_editor(editor, field, change);
                }
            }
        }
    }

    pub fn input_char(&mut self, c: char) {
        self.edit_focused(|value| value.push(c));
    }

    pub fn delete_char(&mut self) {
        self.edit_focused(|value| {
            value.pop();
        });
    }

    pub fn submit(&mut self) {
        match self.focus {
            Focus::List => {}
            Focus::Create(_) => self.submit_create(),
            Focus::Edit(_) => self.submit_edit(),
        }
    }

    fn submit_create(&mut self) {
        let Ok(body) = self.create.begin_submit() else { return };
        let api = Arc::clone(&self.api);
        self.spawn(async move { ApiEvent::Created(api.create(&body).await) });
    }

    fn submit_edit(&mut self) {
        let Some(editor) = self.list.editor_mut() else { return };
        let id = editor.id();
        let Ok(patch) = editor.begin_submit() else { return };
        let api = Arc::clone(&self.api);
        self.spawn(async move { ApiEvent::Updated(api.update(id, &patch).await) });
    }

    // Answers

    pub fn handle(&mut self, event: ApiEvent) {
        debug!(?event, "applying service answer");
        match event {
            ApiEvent::Listed(ticket, result) => {
                if self.list.finish_refresh(ticket, result) {
                    self.clamp_selection();
                }
            }
            ApiEvent::Toggled(id, status, result) => {
                let _ = self.list.finish_toggle(id, status, result);
            }
            ApiEvent::Deleted(id, result) => {
                if self.list.finish_delete(id, result).is_ok() {
                    self.flash = Some("Task deleted".to_string());
                    self.refresh();
                }
            }
            ApiEvent::Created(result) => {
                if self.create.finish_submit(result).is_done() {
                    self.flash = Some("Task added".to_string());
                    self.refresh();
                }
            }
            ApiEvent::Updated(result) => {
                let saved = self
                    .list
                    .editor_mut()
                    .map(|editor| editor.finish_submit(result).is_done())
                    .unwrap_or(false);
                if saved {
                    self.close_editor();
                    self.flash = Some("Task updated".to_string());
                    self.refresh();
                }
            }
        }
    }
}

fn focused_value(field: Field, title: &str, description: &str) -> String {
    match field {
        Field::Title => title.to_string(),
        Field::Description => description.to_string(),
    }
}

fn apply_to_editor(editor: &mut EditController, field: Field, change: impl FnOnce(&mut String)) {
    let mut value = focused_value(field, editor.title(), editor.description());
    change(&mut value);
    match field {
        Field::Title => editor.set_title(value),
        Field::Description => editor.set_description(value),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::runtime::Runtime;
    use todoboard_core::{FormField, NewTask};

    struct StubApi {
        tasks: Mutex<Vec<Task>>,
        create_error: Option<ApiError>,
    }

    #[async_trait]
    impl TaskApi for StubApi {
        async fn list(&self) -> Result<Vec<Task>, ApiError> {
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn create(&self, task: &NewTask) -> Result<Option<Task>, ApiError> {
            if let Some(err) = &self.create_error {
                return Err(err.clone());
            }
            let mut tasks = self.tasks.lock().unwrap();
            let created = Task::new(tasks.len() as TaskId + 1, task.title.clone());
            tasks.push(created.clone());
            Ok(Some(created))
        }

        async fn update(&self, _id: TaskId, _patch: &TaskPatch) -> Result<(), ApiError> {
            Err(ApiError::Network("connection reset".to_string()))
        }

        async fn remove(&self, id: TaskId) -> Result<(), ApiError> {
            self.tasks.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
    }

    fn setup(tasks: Vec<Task>, create_error: Option<ApiError>) -> (Runtime, App, UnboundedReceiver<ApiEvent>) {
        let runtime = Runtime::new().unwrap();
        let api = Arc::new(StubApi {
            tasks: Mutex::new(tasks),
            create_error,
        });
        let (app, receiver) = App::new(api, runtime.handle().clone());
        (runtime, app, receiver)
    }

    /// Waits for the next answer and applies it.
    fn pump(runtime: &Runtime, app: &mut App, receiver: &mut UnboundedReceiver<ApiEvent>) {
        let event = runtime.block_on(receiver.recv()).expect("answer from service");
        app.handle(event);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.input_char(c);
        }
    }

    #[test]
    fn test_refresh_selects_first_row() {
        let (runtime, mut app, mut receiver) = setup(vec![Task::new(1, "Buy milk")], None);

        app.refresh();
        pump(&runtime, &mut app, &mut receiver);

        assert_eq!(app.table.selected(), Some(0));
        assert_eq!(app.selected_task().unwrap().title, "Buy milk");
    }

    #[test]
    fn test_create_flow_clears_form_and_refetches() {
        let (runtime, mut app, mut receiver) = setup(vec![], None);
        app.focus_create();
        type_text(&mut app, "Buy milk");

        app.submit();
        assert!(app.create.is_submitting());
        pump(&runtime, &mut app, &mut receiver);
        assert_eq!(app.create.title(), "");
        assert_eq!(app.flash.as_deref(), Some("Task added"));

        pump(&runtime, &mut app, &mut receiver);
        assert_eq!(app.list.tasks().len(), 1);
    }

    #[test]
    fn test_create_field_error_then_typing_clears_it() {
        let err = ApiError::Field {
            field: FormField::Title,
            message: "too short".to_string(),
        };
        let (runtime, mut app, mut receiver) = setup(vec![], Some(err));
        app.focus_create();
        type_text(&mut app, "abc");

        app.submit();
        pump(&runtime, &mut app, &mut receiver);
        assert_eq!(app.create.errors().and_then(|e| e.title()), Some("too short"));

        app.input_char('d');
        assert_eq!(app.create.errors().and_then(|e| e.title()), None);
        assert_eq!(app.create.title(), "abcd");
    }

    #[test]
    fn test_failed_toggle_keeps_status() {
        let (runtime, mut app, mut receiver) = setup(vec![Task::new(1, "Buy milk")], None);
        app.refresh();
        pump(&runtime, &mut app, &mut receiver);

        app.toggle_selected();
        pump(&runtime, &mut app, &mut receiver);

        assert_eq!(app.list.tasks()[0].status, Status::Pending);
        assert_eq!(app.list.notice(), Some("Cannot connect to the server"));

        app.refresh();
        pump(&runtime, &mut app, &mut receiver);
        assert_eq!(app.list.notice(), None);
    }

    #[test]
    fn test_delete_last_row_refetches_and_moves_selection() {
        let tasks = vec![Task::new(1, "Buy milk"), Task::new(2, "Call mom")];
        let (runtime, mut app, mut receiver) = setup(tasks, None);
        app.refresh();
        pump(&runtime, &mut app, &mut receiver);
        app.next();
        assert_eq!(app.table.selected(), Some(1));

        app.delete_selected();
        assert!(app.list.is_busy(2));
        pump(&runtime, &mut app, &mut receiver);
        assert_eq!(app.flash.as_deref(), Some("Task deleted"));
        assert!(!app.list.is_busy(2));

        pump(&runtime, &mut app, &mut receiver);
        assert_eq!(app.list.tasks().len(), 1);
        assert_eq!(app.table.selected(), Some(0));
        assert_eq!(app.selected_task().unwrap().title, "Buy milk");
    }

    #[test]
    fn test_edit_modal_opens_with_current_values() {
        let task = Task::new(4, "Water plants").with_description("balcony");
        let (runtime, mut app, mut receiver) = setup(vec![task], None);
        app.refresh();
        pump(&runtime, &mut app, &mut receiver);

        app.open_editor();
        assert_eq!(app.focus, Focus::Edit(Field::Title));
        app.next_field();
        app.delete_char();

        let editor = app.list.editor().unwrap();
        assert_eq!(editor.title(), "Water plants");
        assert_eq!(editor.description(), "balcon");

        app.close_editor();
        assert_eq!(app.focus, Focus::List);
        assert!(app.list.editor().is_none());
    }
}
