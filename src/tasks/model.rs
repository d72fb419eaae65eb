//! Task record: one actionable item extracted from an email.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};

/// A single extracted task. Built once from the extraction response and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    /// Short title.
    pub task_name: String,
    /// Due date, `YYYY-MM-DD` by contract of the extraction schema.
    pub due_date: String,
    /// Optional `HH:MM` (24-hour) time, only when the email names one.
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_time: Option<String>,
    /// Longer description.
    pub description: String,
}

impl Task {
    pub fn new(
        task_name: impl Into<String>,
        due_date: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            due_date: due_date.into(),
            due_time: None,
            description: description.into(),
        }
    }

    /// A blank time is stored as no time.
    pub fn with_due_time(mut self, due_time: impl Into<String>) -> Self {
        self.due_time = non_blank(due_time.into());
        self
    }

    /// The due time, if one is set and non-blank.
    pub fn due_time(&self) -> Option<&str> {
        self.due_time.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Due expression handed to the task service's natural-language parser:
    /// `"<date> at <time>"` when a time is set, otherwise just the date.
    pub fn due_string(&self) -> String {
        match self.due_time() {
            Some(time) => format!("{} at {}", self.due_date, time),
            None => self.due_date.clone(),
        }
    }

    /// Whether `due_time` (if any) looks like `HH:MM`. Informational only;
    /// the value is passed through either way.
    pub fn has_well_formed_time(&self) -> bool {
        self.due_time()
            .is_none_or(|t| t.len() == 5 && NaiveTime::parse_from_str(t, "%H:%M").is_ok())
    }
}

fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// `""`, whitespace and `null` all mean "no time".
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(non_blank))
}
