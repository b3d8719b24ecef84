use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::agent::DEFAULT_MAX_ITERATIONS;
use crate::config::{LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "retail-sql")]
#[command(author, version, about = "Load retail CSV data into SQLite and ask questions about it in plain language")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "RETAIL_SQL_DB", default_value = "retail_store.db")]
    pub db: PathBuf,

    /// Log progress to stderr and echo agent steps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recreate the retail tables from CSV files and print the schema
    Load {
        /// Directory holding customers.csv, products.csv, orders.csv and sales.csv
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// CSV delimiter
        #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
        delimiter: u8,
    },

    /// Translate questions into SQL with a single model call
    Translate {
        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Answer questions with an agent that runs SQL tools
    Agent {
        #[command(flatten)]
        llm: LlmArgs,

        /// Let the agent run statements that modify the database
        #[arg(long)]
        allow_writes: bool,

        /// Maximum model calls per question
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
    },
}

#[derive(Args, Debug)]
pub struct LlmArgs {
    /// API key for the chat-completion endpoint
    #[arg(long, env = "TOGETHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "RETAIL_SQL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model name
    #[arg(long, env = "RETAIL_SQL_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature
    #[arg(long, env = "RETAIL_SQL_TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f32,

    /// Request timeout in seconds
    #[arg(long, env = "RETAIL_SQL_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl LlmArgs {
    pub fn into_config(self) -> Result<LlmConfig> {
        Ok(LlmConfig::new(self.api_key)?
            .with_base_url(self.base_url)
            .with_model(self.model)
            .with_temperature(self.temperature)
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("delimiter must be a single ASCII character, got {:?}", s)),
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_agent_flags() {
        let cli = Cli::try_parse_from([
            "retail-sql",
            "--db",
            "store.db",
            "agent",
            "--api-key",
            "k",
            "--allow-writes",
            "--max-iterations",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.db, PathBuf::from("store.db"));
        match cli.command {
            Commands::Agent {
                llm,
                allow_writes,
                max_iterations,
            } => {
                assert!(allow_writes);
                assert_eq!(max_iterations, 4);
                let config = llm.into_config().unwrap();
                assert_eq!(config.api_key, "k");
                assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_load_defaults() {
        let cli = Cli::try_parse_from(["retail-sql", "load", "-d", ";"]).unwrap();
        match cli.command {
            Commands::Load { data_dir, delimiter } => {
                assert_eq!(data_dir, PathBuf::from("data"));
                assert_eq!(delimiter, b';');
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_delimiter_rejects_multibyte() {
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
        assert_eq!(parse_delimiter("\t"), Ok(b'\t'));
    }
}
