//! Inbound email pipeline.
//!
//! Every inbound email flows through:
//! 1. `InboundEvent::email()`: decode the webhook payload
//! 2. `TaskExtractor::extract()`: LLM-powered task extraction
//! 3. `CredentialMap::lookup()`: envelope address → task-service token
//! 4. `TaskSink::create()`: once per task, in order

pub mod handler;
pub mod types;

pub use handler::{DispatchReport, NO_TASKS_FOUND, RequestHandler, format_task_list};
pub use types::{HandlerResponse, InboundEmail, InboundEvent};
