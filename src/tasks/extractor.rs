//! Task extraction: asks the LLM to turn an email into `Task`s through the
//! `create_tasks` function schema.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::llm::{ChatMessage, LlmProvider, ToolCompletionRequest, ToolDefinition};

use super::model::Task;

/// Name of the function the model is offered.
pub const CREATE_TASKS_TOOL: &str = "create_tasks";

/// Turns raw email text into tasks.
#[async_trait]
pub trait TaskExtractor: Send + Sync {
    /// An empty vec means "no tasks found". Errors mean the extraction itself
    /// could not be carried out and must not be read as "no tasks".
    async fn extract(
        &self,
        subject: &str,
        body: &str,
        sender: &str,
    ) -> Result<Vec<Task>, ExtractError>;
}

/// `TaskExtractor` backed by a function-calling chat model.
pub struct LlmTaskExtractor {
    llm: Arc<dyn LlmProvider>,
    today: Option<NaiveDate>,
}

impl LlmTaskExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm, today: None }
    }

    /// Pin "today" instead of reading the wall clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Debug, Deserialize)]
struct CreateTasksArgs {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// JSON Schema for the `create_tasks` arguments.
pub fn create_tasks_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "tasks": {
                "type": "array",
                "description": "List of tasks to create",
                "items": {
                    "type": "object",
                    "properties": {
                        "task_name": {
                            "type": "string",
                            "description": "The name or title of the task"
                        },
                        "due_date": {
                            "type": "string",
                            "format": "date",
                            "description": "The due date for the task in YYYY-MM-DD format"
                        },
                        "due_time": {
                            "type": "string",
                            "description": "Optional time for the task in HH:MM format (24-hour). Only include if a specific time is mentioned."
                        },
                        "description": {
                            "type": "string",
                            "description": "A detailed description of the task"
                        }
                    },
                    "required": ["task_name", "due_date", "description"]
                }
            }
        },
        "required": ["tasks"]
    })
}

fn create_tasks_tool() -> ToolDefinition {
    ToolDefinition {
        name: CREATE_TASKS_TOOL.to_string(),
        description: "Create multiple tasks with names, due dates, and descriptions".to_string(),
        parameters: create_tasks_schema(),
    }
}

pub(crate) fn build_system_prompt(today: NaiveDate) -> String {
    format!(
        "You are a helpful AI assistant, skilled at extracting information from arbitrary text. \
         Today's date is {today}. You have access to a `{CREATE_TASKS_TOOL}` function which can be \
         used to create any tasks you find. Extract ALL tasks mentioned in the email, not just one. \
         If no tasks are found, return an empty list of tasks. When extracting due dates, if a \
         specific time for a task is mentioned (e.g., '3pm', '15:30', 'at 2:30'), include it in \
         the due_time field in 24-hour format (HH:MM). If only a date is mentioned without a \
         specific time, leave the due_time field empty. If the email has been forwarded, do not \
         extract time/date information from the forwarded message headers.",
        today = today.format("%Y-%m-%d"),
    )
}

pub(crate) fn build_user_prompt(subject: &str, body: &str, sender: &str) -> String {
    format!(
        "I will paste an email after this message. If there are any todos/tasks that {sender} \
         asks me to do, please extract ALL the information for the tasks.\n\
         Subject: {subject}\n\
         Body: {body}"
    )
}

/// Decode the `create_tasks` arguments text. Entries keep their order;
/// any malformed entry fails the whole payload.
pub(crate) fn parse_tasks(arguments: &str) -> Result<Vec<Task>, ExtractError> {
    let args: CreateTasksArgs =
        serde_json::from_str(arguments).map_err(ExtractError::MalformedArguments)?;
    Ok(args.tasks)
}

#[async_trait]
impl TaskExtractor for LlmTaskExtractor {
    async fn extract(
        &self,
        subject: &str,
        body: &str,
        sender: &str,
    ) -> Result<Vec<Task>, ExtractError> {
        let today = self.today();
        let request = ToolCompletionRequest::new(
            vec![
                ChatMessage::system(build_system_prompt(today)),
                ChatMessage::user(build_user_prompt(subject, body, sender)),
            ],
            vec![create_tasks_tool()],
        );

        debug!(model = self.llm.model_name(), %today, "Requesting task extraction");
        let response = self.llm.complete_with_tools(request).await?;

        let Some(call) = response.tool_calls.first() else {
            info!("Model made no tool call; treating as no tasks");
            return Ok(Vec::new());
        };

        if call.name != CREATE_TASKS_TOOL {
            return Err(ExtractError::UnexpectedTool(call.name.clone()));
        }

        let tasks = parse_tasks(&call.arguments)?;
        for task in tasks.iter().filter(|t| !t.has_well_formed_time()) {
            warn!(
                task = %task.task_name,
                due_time = ?task.due_time,
                "Extracted due_time is not HH:MM; passing it through unchanged"
            );
        }
        info!(count = tasks.len(), "Extracted tasks");
        Ok(tasks)
    }
}
