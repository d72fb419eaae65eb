//! Task sinks, where extracted tasks end up.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::config::SinkConfig;

use super::model::Task;

/// Creates one task in an external task-management system.
///
/// Failure is reported as `false`, never as an error: callers keep going
/// with the rest of the batch. Implementations make a single attempt.
#[async_trait]
pub trait TaskSink: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    async fn create(&self, credential: &SecretString, task: &Task) -> bool;
}

/// `TaskSink` backed by the Todoist REST API.
pub struct TodoistSink {
    client: reqwest::Client,
    base_url: String,
}

impl TodoistSink {
    /// The client's timeout bounds each creation call.
    pub fn new(client: reqwest::Client, config: &SinkConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }
}

/// Request body for `POST /tasks`.
pub(crate) fn task_payload(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "content": task.task_name,
        "description": task.description,
        "due_string": task.due_string(),
    })
}

/// The two statuses Todoist uses to acknowledge a created task.
pub(crate) fn is_created(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::NO_CONTENT
}

#[async_trait]
impl TaskSink for TodoistSink {
    fn name(&self) -> &str {
        "todoist"
    }

    async fn create(&self, credential: &SecretString, task: &Task) -> bool {
        let resp = self
            .client
            .post(self.tasks_url())
            .bearer_auth(credential.expose_secret())
            .json(&task_payload(task))
            .send()
            .await;

        match resp {
            Ok(resp) if is_created(resp.status()) => {
                debug!(task = %task.task_name, status = %resp.status(), "Todoist task created");
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(task = %task.task_name, %status, body = %body, "Todoist rejected task");
                false
            }
            Err(e) => {
                warn!(task = %task.task_name, error = %e, "Todoist request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn sink(base_url: &str) -> TodoistSink {
        TodoistSink::new(
            reqwest::Client::new(),
            &SinkConfig {
                base_url: base_url.to_string(),
            },
        )
    }

    fn token() -> SecretString {
        SecretString::from("todo-token".to_string())
    }

    #[test]
    fn payload_with_time() {
        let task = Task::new("Call Bob", "2026-10-20", "Invoice").with_due_time("15:30");
        assert_eq!(
            task_payload(&task),
            serde_json::json!({
                "content": "Call Bob",
                "description": "Invoice",
                "due_string": "2026-10-20 at 15:30"
            })
        );
    }

    #[test]
    fn payload_without_time() {
        let task = Task::new("Call Bob", "2026-10-20", "Invoice");
        assert_eq!(task_payload(&task)["due_string"], "2026-10-20");
    }

    #[test]
    fn created_statuses() {
        assert!(is_created(StatusCode::OK));
        assert!(is_created(StatusCode::NO_CONTENT));
        assert!(!is_created(StatusCode::CREATED));
        assert!(!is_created(StatusCode::BAD_REQUEST));
        assert!(!is_created(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn posts_task_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks")
            .match_header("authorization", "Bearer todo-token")
            .match_body(Matcher::Json(serde_json::json!({
                "content": "Book venue",
                "description": "For the offsite",
                "due_string": "2026-10-20 at 15:30"
            })))
            .with_status(200)
            .with_body(r#"{"id": "123"}"#)
            .expect(1)
            .create_async()
            .await;

        let task = Task::new("Book venue", "2026-10-20", "For the offsite").with_due_time("15:30");
        assert!(sink(&server.url()).create(&token(), &task).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn no_content_counts_as_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/tasks")
            .with_status(204)
            .create_async()
            .await;

        let task = Task::new("a", "2026-10-20", "b");
        assert!(sink(&server.url()).create(&token(), &task).await);
    }

    #[tokio::test]
    async fn other_status_is_failure_not_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/tasks")
            .with_status(403)
            .with_body("Forbidden")
            .create_async()
            .await;

        let task = Task::new("a", "2026-10-20", "b");
        assert!(!sink(&server.url()).create(&token(), &task).await);
    }

    #[tokio::test]
    async fn unreachable_host_is_failure() {
        let task = Task::new("a", "2026-10-20", "b");
        assert!(!sink("http://127.0.0.1:1").create(&token(), &task).await);
    }
}
