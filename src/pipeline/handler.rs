//! Request handler: inbound email in, tasks filed, summary out.
//!
//! Flow:
//! 1. Decode the inbound event
//! 2. Extract tasks (one LLM call; failure is fatal)
//! 3. No tasks → `200 "No tasks found."`
//! 4. Look up the envelope address → `401` if unmapped, nothing is filed
//! 5. File every task in extraction order, one call each
//! 6. `200` with the numbered task list
//!
//! Per-task filing results are logged but never change the response.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::config::CredentialMap;
use crate::error::HandlerError;
use crate::tasks::{Task, TaskExtractor, TaskSink};

use super::types::{HandlerResponse, InboundEmail, InboundEvent};

/// Body returned when the email contained no tasks.
pub const NO_TASKS_FOUND: &str = "No tasks found.";

/// Outcome of filing a batch of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub created: usize,
}

impl DispatchReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.created
    }
}

/// Orchestrates extraction, credential lookup and task filing.
pub struct RequestHandler {
    extractor: Arc<dyn TaskExtractor>,
    sink: Arc<dyn TaskSink>,
    credentials: Arc<CredentialMap>,
}

impl RequestHandler {
    pub fn new(
        extractor: Arc<dyn TaskExtractor>,
        sink: Arc<dyn TaskSink>,
        credentials: Arc<CredentialMap>,
    ) -> Self {
        Self {
            extractor,
            sink,
            credentials,
        }
    }

    /// Handle a raw webhook event.
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<HandlerResponse, HandlerError> {
        let email = event.email()?;
        self.handle(&email).await
    }

    /// Handle a decoded email.
    pub async fn handle(&self, email: &InboundEmail) -> Result<HandlerResponse, HandlerError> {
        info!(
            sender = %email.sender(),
            subject = %email.subject(),
            envelope = %email.envelope_address(),
            "Processing inbound email"
        );
        debug!(body = %email.body(), "Inbound email body");

        let tasks = self
            .extractor
            .extract(email.subject(), email.body(), email.sender())
            .await?;

        if tasks.is_empty() {
            info!("No tasks found in email");
            return Ok(HandlerResponse::ok(NO_TASKS_FOUND));
        }

        let address = email.envelope_address();
        let Some(credential) = self.credentials.lookup(address) else {
            warn!(
                envelope = %address,
                tasks = tasks.len(),
                "No task-service credential mapped for envelope address"
            );
            return Ok(HandlerResponse::unauthorized(format!(
                "Didn't find mapping for email address: {address}"
            )));
        };

        let body = format_task_list(&tasks);
        debug!(body = %body, "Response body");

        let report = self.dispatch(credential, &tasks).await;
        info!(
            sink = self.sink.name(),
            attempted = report.attempted,
            created = report.created,
            failed = report.failed(),
            "Tasks dispatched"
        );

        Ok(HandlerResponse::ok(body))
    }

    /// File each task once, in order. A failure does not stop the batch.
    async fn dispatch(&self, credential: &SecretString, tasks: &[Task]) -> DispatchReport {
        let mut report = DispatchReport::default();
        for task in tasks {
            report.attempted += 1;
            if self.sink.create(credential, task).await {
                report.created += 1;
            } else {
                warn!(task = %task.task_name, "Failed to create task");
            }
        }
        report
    }
}

/// Render the `Found N task(s):` summary.
pub fn format_task_list(tasks: &[Task]) -> String {
    let entries: Vec<String> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let time_info = task
                .due_time()
                .map(|t| format!(" at {t}"))
                .unwrap_or_default();
            format!(
                "Task {}:\nTask Name: {}\nDue Date: {}{}\nDescription: {}",
                i + 1,
                task.task_name,
                task.due_date,
                time_info,
                task.description
            )
        })
        .collect();

    format!("Found {} task(s):\n\n{}", tasks.len(), entries.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::error::{ExtractError, LlmError};

    struct FixedExtractor {
        tasks: Vec<Task>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FixedExtractor {
        fn returning(tasks: Vec<Task>) -> Arc<Self> {
            Arc::new(Self {
                tasks,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                tasks: vec![],
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TaskExtractor for FixedExtractor {
        async fn extract(
            &self,
            _subject: &str,
            _body: &str,
            _sender: &str,
        ) -> Result<Vec<Task>, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ExtractError::Llm(LlmError::HttpStatus {
                    provider: "openai".into(),
                    status: 502,
                    body: "bad gateway".into(),
                }));
            }
            Ok(self.tasks.clone())
        }
    }

    /// Records every call; fails the task names listed in `reject`.
    struct RecordingSink {
        calls: Mutex<Vec<(String, Task)>>,
        reject: Vec<String>,
    }

    impl RecordingSink {
        fn rejecting(names: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reject: names.iter().map(|n| n.to_string()).collect(),
            })
        }

        fn calls(&self) -> Vec<(String, Task)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaskSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn create(&self, credential: &SecretString, task: &Task) -> bool {
            self.calls
                .lock()
                .unwrap()
                .push((credential.expose_secret().to_string(), task.clone()));
            !self.reject.contains(&task.task_name)
        }
    }

    fn credentials() -> Arc<CredentialMap> {
        Arc::new(CredentialMap::from_pairs([("me@example.com", "tok-me")]))
    }

    fn email(envelope: &str) -> InboundEmail {
        InboundEmail::new(
            "Alice <alice@example.com>",
            "  Offsite planning ",
            "Please book the venue and send invites.\n",
            envelope,
        )
    }

    fn two_tasks() -> Vec<Task> {
        vec![
            Task::new("Book venue", "2026-10-20", "For the offsite").with_due_time("15:30"),
            Task::new("Send invites", "2026-10-21", "To the whole team"),
        ]
    }

    #[tokio::test]
    async fn no_tasks_skips_lookup_and_dispatch() {
        let sink = RecordingSink::rejecting(&[]);
        let handler = RequestHandler::new(
            FixedExtractor::returning(vec![]),
            sink.clone(),
            Arc::new(CredentialMap::default()),
        );

        let resp = handler.handle(&email("unknown@example.com")).await.unwrap();
        assert_eq!(resp, HandlerResponse::ok("No tasks found."));
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn unmapped_address_is_unauthorized_and_files_nothing() {
        let sink = RecordingSink::rejecting(&[]);
        let handler =
            RequestHandler::new(FixedExtractor::returning(two_tasks()), sink.clone(), credentials());

        let resp = handler.handle(&email("stranger@example.com")).await.unwrap();
        assert_eq!(resp.status_code, 401);
        assert_eq!(
            resp.body,
            "Didn't find mapping for email address: stranger@example.com"
        );
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn lookup_uses_envelope_not_from_header() {
        let sink = RecordingSink::rejecting(&[]);
        let creds = Arc::new(CredentialMap::from_pairs([(
            "Alice <alice@example.com>",
            "tok-alice",
        )]));
        let handler = RequestHandler::new(FixedExtractor::returning(two_tasks()), sink.clone(), creds);

        let resp = handler.handle(&email("me@example.com")).await.unwrap();
        assert_eq!(resp.status_code, 401);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn files_every_task_in_order_with_credential() {
        let sink = RecordingSink::rejecting(&[]);
        let handler =
            RequestHandler::new(FixedExtractor::returning(two_tasks()), sink.clone(), credentials());

        let resp = handler.handle(&email("me@example.com")).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert!(resp.body.starts_with("Found 2 task(s):\n\n"));

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "tok-me");
        assert_eq!(calls[0].1.task_name, "Book venue");
        assert_eq!(calls[1].1.task_name, "Send invites");
    }

    #[tokio::test]
    async fn sink_failure_does_not_stop_batch_or_change_response() {
        let tasks = vec![
            Task::new("one", "2026-10-20", "a"),
            Task::new("two", "2026-10-21", "b"),
            Task::new("three", "2026-10-22", "c"),
        ];
        let all_ok = RecordingSink::rejecting(&[]);
        let some_fail = RecordingSink::rejecting(&["one", "two"]);

        let ok_resp = RequestHandler::new(
            FixedExtractor::returning(tasks.clone()),
            all_ok.clone(),
            credentials(),
        )
        .handle(&email("me@example.com"))
        .await
        .unwrap();
        let failing_resp = RequestHandler::new(
            FixedExtractor::returning(tasks),
            some_fail.clone(),
            credentials(),
        )
        .handle(&email("me@example.com"))
        .await
        .unwrap();

        assert_eq!(ok_resp, failing_resp);
        assert_eq!(some_fail.calls().len(), 3);
        assert_eq!(some_fail.calls()[2].1.task_name, "three");
    }

    #[tokio::test]
    async fn extraction_failure_is_fatal() {
        let extractor = FixedExtractor::failing();
        let sink = RecordingSink::rejecting(&[]);
        let handler = RequestHandler::new(extractor.clone(), sink.clone(), credentials());

        let err = handler.handle(&email("me@example.com")).await.unwrap_err();
        assert!(matches!(err, HandlerError::Extract(_)));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn bad_event_payload_is_fatal() {
        let handler = RequestHandler::new(
            FixedExtractor::returning(vec![]),
            RecordingSink::rejecting(&[]),
            credentials(),
        );
        let event = InboundEvent {
            body: "{not json".into(),
        };
        let err = handler.handle_event(&event).await.unwrap_err();
        assert!(matches!(err, HandlerError::Inbound(_)));
    }

    #[test]
    fn task_list_format() {
        let body = format_task_list(&two_tasks());
        assert_eq!(
            body,
            "Found 2 task(s):\n\n\
             Task 1:\nTask Name: Book venue\nDue Date: 2026-10-20 at 15:30\nDescription: For the offsite\n\n\
             Task 2:\nTask Name: Send invites\nDue Date: 2026-10-21\nDescription: To the whole team"
        );
    }

    #[test]
    fn empty_due_time_renders_date_only() {
        let mut task = Task::new("a", "2026-10-20", "b");
        task.due_time = Some(String::new());
        assert_eq!(
            format_task_list(&[task]),
            "Found 1 task(s):\n\nTask 1:\nTask Name: a\nDue Date: 2026-10-20\nDescription: b"
        );
    }

    #[test]
    fn dispatch_report_failed_count() {
        let report = DispatchReport {
            attempted: 3,
            created: 1,
        };
        assert_eq!(report.failed(), 2);
    }
}
