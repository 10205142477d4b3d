//! StratLab CLI — classify strategy prompts and manage their history.
//!
//! Commands:
//! - `process` — classify one prompt and print the combined report
//! - `interactive` — read prompts from stdin until `quit`
//! - `history`, `search`, `stats`, `delete` — inspect the JSONL history
//! - `export` — write stored records as CSV
//! - `schema` — print the validation schema as JSON
//! - `config init` — write the default configuration as TOML

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stratlab_core::domain::{Metadata, PromptId};
use stratlab_core::gate::CompatibilityGate;
use stratlab_runner::config::DEFAULT_CONFIG_FILE;
use stratlab_runner::report::{render_history, render_stats};
use stratlab_runner::{
    export_records_csv, render_json, render_text, HistorySummary, Pipeline, PipelineConfig,
    PipelineResult, PromptHistory,
};

#[derive(Parser)]
#[command(
    name = "stratlab",
    about = "StratLab CLI — classify DeFi strategy prompts into structured records"
)]
struct Cli {
    /// Configuration file. Defaults to ./stratlab.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by STRATLAB_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one prompt and print the combined report.
    Process {
        /// Free-form strategy description.
        text: String,

        /// User the prompt belongs to.
        #[arg(long)]
        user: Option<String>,

        /// Extra metadata as a JSON object.
        #[arg(long)]
        metadata: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Skip writing to the history store.
        #[arg(long, default_value_t = false)]
        no_store: bool,
    },
    /// Read prompts from stdin, one per line. `quit` or `exit` stops.
    Interactive {
        #[arg(long)]
        user: Option<String>,
    },
    /// List stored prompts, newest first.
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[arg(long)]
        user: Option<String>,
    },
    /// Case-insensitive search over stored prompt text.
    Search {
        query: String,

        #[arg(long)]
        user: Option<String>,
    },
    /// Summary counts for the history store.
    Stats,
    /// Delete a prompt with its records and results.
    Delete { prompt_id: String },
    /// Export stored records as CSV.
    Export {
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Print the validation schema as JSON.
    Schema,
    /// Configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration as TOML.
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Process { text, user, metadata, format, no_store } => {
            let mut config = load_config(config_path)?;
            if no_store {
                config.storage.enabled = false;
            }
            run_process(&config, &text, user.as_deref(), metadata.as_deref(), format)
        }
        Commands::Interactive { user } => {
            let pipeline = Pipeline::from_config(&load_config(config_path)?)?;
            run_interactive(&pipeline, user.as_deref())
        }
        Commands::History { limit, user } => {
            let history = open_history(&load_config(config_path)?)?;
            let rows = history.history(Some(limit), user.as_deref())?;
            print!("{}", render_history(&rows));
            Ok(())
        }
        Commands::Search { query, user } => {
            let history = open_history(&load_config(config_path)?)?;
            let hits = history.search(&query, user.as_deref())?;
            let rows: Vec<HistorySummary> = hits.iter().map(HistorySummary::from).collect();
            println!("{} match(es) for '{query}'", rows.len());
            print!("{}", render_history(&rows));
            Ok(())
        }
        Commands::Stats => {
            let stats = open_history(&load_config(config_path)?)?.stats()?;
            print!("{}", render_stats(&stats));
            Ok(())
        }
        Commands::Delete { prompt_id } => {
            let id = PromptId::new(prompt_id);
            if !open_history(&load_config(config_path)?)?.delete_prompt(&id)? {
                bail!("no prompt with id {id}");
            }
            println!("Deleted prompt {id}");
            Ok(())
        }
        Commands::Export { output } => {
            let records = open_history(&load_config(config_path)?)?.records()?;
            let rows = export_records_csv(&records, &output)?;
            println!("Exported {rows} record(s) to {}", output.display());
            Ok(())
        }
        Commands::Schema => run_schema(),
        Commands::Config { action: ConfigAction::Init { path, force } } => run_config_init(&path, force),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = PipelineConfig::load_with_dotenv(path)?;
    debug!(
        storage = %config.storage.dir.display(),
        enabled = config.storage.enabled,
        "configuration loaded"
    );
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("STRATLAB_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_process(
    config: &PipelineConfig,
    text: &str,
    user: Option<&str>,
    metadata: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let metadata = parse_metadata(metadata)?;
    let pipeline = Pipeline::from_config(config)?;
    let result = pipeline.process(text, user, metadata);
    print_result(&result, format)?;
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn open_history(config: &PipelineConfig) -> Result<PromptHistory> {
    PromptHistory::open(&config.storage.dir)
        .with_context(|| format!("failed to open history at {}", config.storage.dir.display()))
}

fn parse_metadata(raw: Option<&str>) -> Result<Metadata> {
    match raw {
        None => Ok(Metadata::new()),
        Some(raw) => serde_json::from_str(raw).context("--metadata must be a JSON object"),
    }
}

fn print_result(result: &PipelineResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(result)),
        OutputFormat::Json => println!("{}", render_json(result)?),
    }
    Ok(())
}

fn run_interactive(pipeline: &Pipeline, user: Option<&str>) -> Result<()> {
    println!("Describe a strategy per line. Type 'quit' to exit.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        match text.to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            _ => {}
        }

        let result = pipeline.process(text, user, Metadata::new());
        print_result(&result, OutputFormat::Text)?;
        println!();
    }
    Ok(())
}

fn run_schema() -> Result<()> {
    let schema = CompatibilityGate::default().schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    PipelineConfig::default().write_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
