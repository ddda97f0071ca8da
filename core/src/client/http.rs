use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::traits::{ApiError, TaskApi};
use crate::config::ApiConfig;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::validation::FormField;

const COLLECTION_PATH: &str = "/api/todos";

const CREATE_FAILED: &str = "Failed to add the task";
const UPDATE_FAILED: &str = "Failed to update the task";
const REMOVE_FAILED: &str = "Failed to delete the task";

/// Error payload sent with non-2xx answers. Both keys are optional.
#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `TaskApi` over the service's REST endpoints.
#[derive(Clone)]
pub struct HttpTaskClient {
    http: Client,
    base_url: String,
}

impl HttpTaskClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, COLLECTION_PATH)
    }

    fn item_url(&self, id: TaskId) -> String {
        format!("{}{}/{}", self.base_url, COLLECTION_PATH, id)
    }

    /// Sends a mutating request. Returns the body of a 2xx answer, or the
    /// error the failure body describes.
    async fn send_mutation(&self, request: RequestBuilder, fallback: &str) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            let err = interpret_failure(status, &body, fallback);
            warn!(%status, error = %err, "service rejected request");
            Err(err)
        }
    }
}

#[async_trait]
impl TaskApi for HttpTaskClient {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let url = self.collection_url();
        debug!(%url, "listing tasks");

        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            warn!(%status, "task list request was not successful");
        }

        Ok(parse_task_list(&body))
    }

    async fn create(&self, task: &NewTask) -> Result<Option<Task>, ApiError> {
        let url = self.collection_url();
        debug!(%url, title = %task.title, "creating task");

        let body = self
            .send_mutation(self.http.post(&url).json(task), CREATE_FAILED)
            .await?;

        // Some services answer 201 with no body, or with an ack envelope.
        Ok(serde_json::from_slice::<Task>(&body).ok())
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<(), ApiError> {
        let url = self.item_url(id);
        debug!(%url, ?patch, "updating task");

        self.send_mutation(self.http.put(&url).json(patch), UPDATE_FAILED)
            .await
            .map(|_| ())
    }

    async fn remove(&self, id: TaskId) -> Result<(), ApiError> {
        let url = self.item_url(id);
        debug!(%url, "removing task");

        self.send_mutation(self.http.delete(&url), REMOVE_FAILED)
            .await
            .map(|_| ())
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    warn!(error = %err, "request to todo service failed");
    ApiError::Network(err.to_string())
}

fn parse_task_list(body: &[u8]) -> Vec<Task> {
    match serde_json::from_slice::<Vec<Task>>(body) {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!(error = %err, "task list payload is not a task array, showing none");
            Vec::new()
        }
    }
}

/// Reads a non-2xx answer. A body that is not JSON at all (a proxy error page,
/// a truncated answer) counts as not reaching the service.
fn interpret_failure(status: StatusCode, body: &[u8], fallback: &str) -> ApiError {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            debug!(%status, error = %err, "failure body is not JSON");
            return ApiError::Network(format!("unreadable {} answer", status));
        }
    };
    let parsed: FailureBody = serde_json::from_value(value).unwrap_or_default();
    let message = parsed
        .error
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());

    match parsed.field.as_deref().and_then(FormField::from_wire) {
        Some(field) => ApiError::Field { field, message },
        None => {
            debug!(%status, field = ?parsed.field, "reporting failure as general");
            ApiError::General(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Status;
    use serde_json::json;
    use warp::http::StatusCode as WarpStatus;
    use warp::Filter;

    /// Serves `routes` on an ephemeral local port and returns its base URL.
    macro_rules! stub_server {
        ($routes:expr) => {{
            let (addr, server) = warp::serve($routes).bind_ephemeral(([127, 0, 0, 1], 0));
            tokio::spawn(server);
            format!("http://{}", addr)
        }};
    }

    fn client_for(base_url: &str) -> HttpTaskClient {
        HttpTaskClient::new(&ApiConfig::new(base_url).unwrap()).unwrap()
    }

    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}", port)
    }

    #[test]
    fn test_interpret_failure_field_scoped() {
        let body = br#"{"field": "title", "error": "too short"}"#;
        let err = interpret_failure(StatusCode::BAD_REQUEST, body, CREATE_FAILED);
        assert_eq!(
            err,
            ApiError::Field {
                field: FormField::Title,
                message: "too short".to_string()
            }
        );
    }

    #[test]
    fn test_interpret_failure_unknown_field_is_general() {
        let body = br#"{"field": "priority", "error": "bad priority"}"#;
        let err = interpret_failure(StatusCode::BAD_REQUEST, body, CREATE_FAILED);
        assert_eq!(err, ApiError::General("bad priority".to_string()));
    }

    #[test]
    fn test_interpret_failure_without_message_uses_fallback() {
        let bodies: [&[u8]; 3] = [b"{}", br#"{"error": "  "}"#, b"[]"];
        for body in bodies {
            let err = interpret_failure(StatusCode::INTERNAL_SERVER_ERROR, body, UPDATE_FAILED);
            assert_eq!(err, ApiError::General(UPDATE_FAILED.to_string()));
        }
    }

    #[test]
    fn test_interpret_failure_non_json_is_connection_error() {
        let bodies: [&[u8]; 2] = [b"", b"<html>502 Bad Gateway</html>"];
        for body in bodies {
            let err = interpret_failure(StatusCode::BAD_GATEWAY, body, UPDATE_FAILED);
            assert!(err.is_network());
            assert_eq!(err.user_message(), "Cannot connect to the server");
        }
    }

    #[test]
    fn test_parse_task_list_degrades_to_empty() {
        assert!(parse_task_list(b"not json").is_empty());
        assert!(parse_task_list(br#"{"tasks": []}"#).is_empty());
        assert!(parse_task_list(br#"[{"id": "x"}]"#).is_empty());

        let tasks = parse_task_list(br#"[{"id": 1, "title": "Walk", "status": "Completed"}]"#);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, Status::Completed);
    }

    #[tokio::test]
    async fn test_list_against_stub() {
        let routes = warp::path!("api" / "todos").and(warp::get()).map(|| {
            warp::reply::json(&json!([
                {"id": 1, "title": "Buy milk", "description": "", "status": "Pending"},
                {"id": 2, "title": "Call mom", "description": "Sunday", "status": "Completed"}
            ]))
        });
        let base = stub_server!(routes);

        let tasks = client_for(&base).list().await.unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].title, "Call mom");
        assert_eq!(tasks[1].status, Status::Completed);
    }

    #[tokio::test]
    async fn test_list_non_json_is_empty() {
        let routes = warp::path!("api" / "todos").map(|| "internal error");
        let base = stub_server!(routes);

        let tasks = client_for(&base).list().await.unwrap();

        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_list_unreachable_is_network_error() {
        let err = client_for(&closed_port_url()).list().await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.user_message(), "Cannot connect to the server");
    }

    #[tokio::test]
    async fn test_create_returns_created_task() {
        let routes = warp::path!("api" / "todos")
            .and(warp::post())
            .and(warp::body::json())
            .map(|body: NewTask| {
                let created = Task::new(42, body.title).with_description(body.description);
                warp::reply::with_status(warp::reply::json(&created), WarpStatus::CREATED)
            });
        let base = stub_server!(routes);

        let created = client_for(&base)
            .create(&NewTask {
                title: "Write report".to_string(),
                description: "quarterly".to_string(),
            })
            .await
            .unwrap()
            .expect("created task in body");

        assert_eq!(created.id, 42);
        assert_eq!(created.title, "Write report");
        assert_eq!(created.description.as_deref(), Some("quarterly"));
    }

    #[tokio::test]
    async fn test_create_with_empty_body_succeeds() {
        let routes = warp::path!("api" / "todos").and(warp::post()).map(warp::reply);
        let base = stub_server!(routes);

        let created = client_for(&base)
            .create(&NewTask {
                title: "Write report".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(created, None);
    }

    #[tokio::test]
    async fn test_create_field_error() {
        let routes = warp::path!("api" / "todos").and(warp::post()).map(|| {
            warp::reply::with_status(
                warp::reply::json(&json!({"field": "title", "error": "too short"})),
                WarpStatus::BAD_REQUEST,
            )
        });
        let base = stub_server!(routes);

        let err = client_for(&base)
            .create(&NewTask {
                title: "abc".to_string(),
                description: String::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::Field {
                field: FormField::Title,
                message: "too short".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_update_sends_only_patched_fields() {
        let routes = warp::path!("api" / "todos" / i64)
            .and(warp::put())
            .and(warp::body::json())
            .map(|id: i64, body: serde_json::Value| {
                if id == 5 && body == json!({"status": "Completed"}) {
                    warp::reply::with_status(warp::reply::json(&json!({"ok": true})), WarpStatus::OK)
                } else {
                    warp::reply::with_status(
                        warp::reply::json(&json!({"error": format!("unexpected {} {}", id, body)})),
                        WarpStatus::UNPROCESSABLE_ENTITY,
                    )
                }
            });
        let base = stub_server!(routes);

        client_for(&base)
            .update(5, &TaskPatch::status(Status::Completed))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_server_error_is_general() {
        let routes = warp::path!("api" / "todos" / i64).and(warp::put()).map(|_id: i64| {
            warp::reply::with_status(
                warp::reply::json(&json!({"error": "server exploded"})),
                WarpStatus::INTERNAL_SERVER_ERROR,
            )
        });
        let base = stub_server!(routes);

        let err = client_for(&base)
            .update(3, &TaskPatch::fields("New title", ""))
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::General("server exploded".to_string()));
    }

    #[tokio::test]
    async fn test_update_behind_failing_proxy_cannot_connect() {
        let routes = warp::path!("api" / "todos" / i64).and(warp::put()).map(|_id: i64| {
            warp::reply::with_status(
                warp::reply::html("<html>502 Bad Gateway</html>"),
                WarpStatus::BAD_GATEWAY,
            )
        });
        let base = stub_server!(routes);

        let err = client_for(&base)
            .update(1, &TaskPatch::fields("New title", ""))
            .await
            .unwrap_err();

        assert!(err.is_network());
        assert_eq!(err.user_message(), "Cannot connect to the server");
    }

    #[tokio::test]
    async fn test_remove_checks_status() {
        let routes = warp::path!("api" / "todos" / i64)
            .and(warp::delete())
            .map(|id: i64| {
                if id == 1 {
                    warp::reply::with_status(warp::reply::json(&json!({})), WarpStatus::OK)
                } else {
                    warp::reply::with_status(warp::reply::json(&json!({})), WarpStatus::NOT_FOUND)
                }
            });
        let base = stub_server!(routes);
        let client = client_for(&base);

        client.remove(1).await.unwrap();
        let err = client.remove(99).await.unwrap_err();
        assert_eq!(err, ApiError::General(REMOVE_FAILED.to_string()));
    }
}
