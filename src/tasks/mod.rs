//! Tasks: the extracted record, the extractor that produces it, and the
//! sink that files it with a task-management service.

pub mod extractor;
pub mod model;
pub mod sink;

pub use extractor::{LlmTaskExtractor, TaskExtractor};
pub use model::Task;
pub use sink::{TaskSink, TodoistSink};
