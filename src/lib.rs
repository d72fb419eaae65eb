//! Inbox Tasks turns inbound emails into task-manager entries.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod tasks;
