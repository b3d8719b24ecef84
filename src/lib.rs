pub mod agent;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod logging;
pub mod repl;
pub mod storage;
pub mod translate;

pub use agent::{AgentOutcome, SqlAgent};
pub use config::LlmConfig;
pub use database::{AccessMode, Database, DatabaseSchema, LoadReport, Loader};
pub use error::{Error, Result};
pub use llm::{ChatClient, ChatModel, Message};
pub use translate::Translator;
