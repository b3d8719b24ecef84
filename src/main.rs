use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Runtime;

use retail_sql::agent::{AgentOutcome, SqlAgent};
use retail_sql::cli::{Cli, Commands, LlmArgs};
use retail_sql::database::{AccessMode, Database, Loader};
use retail_sql::logging::init_logging;
use retail_sql::llm::{ChatClient, ChatModel};
use retail_sql::repl::Repl;
use retail_sql::storage::csv::CsvReader;
use retail_sql::translate::{Translator, EXAMPLE_QUESTIONS};
use retail_sql::Error;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the environment may already carry the key.
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Load { data_dir, delimiter } => run_load(&cli.db, &data_dir, delimiter)?,
        Commands::Translate { llm } => run_translate(&cli.db, llm)?,
        Commands::Agent {
            llm,
            allow_writes,
            max_iterations,
        } => {
            let mode = if allow_writes {
                AccessMode::ReadWrite
            } else {
                AccessMode::ReadOnly
            };
            run_agent(&cli.db, llm, mode, max_iterations, cli.verbose)?
        }
    }

    Ok(())
}

fn run_load(db_path: &Path, data_dir: &Path, delimiter: u8) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open(db_path, AccessMode::ReadWrite)?;

    let reader = CsvReader::new().with_delimiter(delimiter);
    let report = Loader::new(&mut db).with_reader(reader).load_directory(data_dir)?;
    println!("{}", report);

    let schema = db.schema()?;
    print!("{}", schema.render_listing());

    Ok(())
}

fn run_translate(db_path: &Path, llm: LlmArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = llm.into_config()?;
    let db = open_existing(db_path, AccessMode::ReadOnly)?;
    let schema = db.schema()?;
    drop(db);

    let client = ChatClient::new(config)?;
    tracing::info!(model = %client.config().model, tables = schema.tables.len(), "translator ready");
    let model: Arc<dyn ChatModel> = Arc::new(client);
    let translator = Translator::new(model, &schema);
    tracing::debug!(template_len = translator.template().len(), "prompt template built");

    let runtime = build_runtime()?;

    let stdin = io::stdin();
    let mut repl = Repl::new(stdin.lock(), io::stdout(), "Ask your question: ");
    repl.print("Natural Language to SQL Converter")?;
    repl.print("Converts your questions into optimized SQL queries with explanations.")?;
    repl.print("Type 'exit' to quit.\n")?;
    repl.print("Example questions you can ask:")?;
    for example in EXAMPLE_QUESTIONS {
        repl.print(&format!("- {}", example))?;
    }

    repl.run(|question| {
        let text = runtime.block_on(translator.translate(question))?;
        Ok(format!("\nGenerated Response:\n{}", text))
    })?;

    Ok(())
}

fn run_agent(
    db_path: &Path,
    llm: LlmArgs,
    mode: AccessMode,
    max_iterations: usize,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = llm.into_config()?;
    let db = open_existing(db_path, mode)?;

    let client = ChatClient::new(config)?;
    tracing::info!(model = %client.config().model, %mode, "agent ready");
    let model: Arc<dyn ChatModel> = Arc::new(client);
    let agent = SqlAgent::new(model, &db).with_max_iterations(max_iterations);

    let runtime = build_runtime()?;

    let stdin = io::stdin();
    let mut repl = Repl::new(stdin.lock(), io::stdout(), "Ask your question: ");
    repl.print(&format!("NLP-to-SQL Agent ({})", mode))?;
    repl.print("Type 'exit' to quit. Ask anything about the retail store database.")?;
    if mode == AccessMode::ReadWrite {
        repl.print("Warning: write access is enabled; statements chosen by the model are committed immediately.")?;
    }
    repl.run(|question| {
        let outcome = runtime.block_on(agent.run(question))?;
        Ok(render_outcome(&outcome, verbose))
    })?;

    Ok(())
}

fn render_outcome(outcome: &AgentOutcome, verbose: bool) -> String {
    let mut out = String::new();
    if verbose {
        for step in &outcome.steps {
            out.push_str(&format!("\n{}\nObservation: {}\n", step.log, step.observation));
        }
    }
    out.push_str(&format!("\nFinal Result:\n{}", outcome.output));
    out
}

fn open_existing(db_path: &Path, mode: AccessMode) -> Result<Database, Error> {
    if !db_path.is_file() {
        return Err(Error::Config(format!(
            "database {} not found; run `retail-sql load` first",
            db_path.display()
        )));
    }
    Database::open(db_path, mode)
}

fn build_runtime() -> Result<Runtime, Error> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(runtime)
}
