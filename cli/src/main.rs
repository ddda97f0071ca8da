mod commands;
mod logging;
mod tui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use todoboard_core::{ApiConfig, ConfigOverrides, FileConfig, HttpTaskClient, TaskId};

use crate::logging::LogTarget;

#[derive(Parser)]
#[command(name = "todoboard")]
#[command(about = "Terminal client for a remote todo list", long_about = None)]
struct Cli {
    /// Base URL of the todo service
    #[arg(long, global = true, env = "TODOBOARD_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Config file to read instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List all tasks with completed/pending counts
    List,
    /// Add a new task (usage: add Buy milk -d "two litres")
    Add {
        /// Task title
        title: Vec<String>,
        /// Optional description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Change the title and/or description of a task
    Edit {
        id: TaskId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Flip a task between Pending and Completed
    Toggle { id: TaskId },
    /// Delete a task
    Rm { id: TaskId },
    /// Open the Terminal User Interface
    Tui,
}

fn load_config(cli: &Cli) -> Result<ApiConfig> {
    let file = match cli.config.clone().or_else(FileConfig::default_path) {
        Some(path) => FileConfig::load(&path)?,
        None => FileConfig::default(),
    };
    let overrides = ConfigOverrides {
        api_url: cli.api_url.clone(),
        timeout_secs: cli.timeout,
    };
    Ok(ApiConfig::resolve(&overrides, &file)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Without a subcommand the TUI opens, as that is the main way to use it.
    let command = cli.command.as_ref().map_or(&Commands::Tui, |c| c);

    logging::init(match command {
        Commands::Tui => LogTarget::File,
        _ => LogTarget::Stderr,
    })?;

    let config = load_config(&cli)?;
    tracing::debug!(base_url = config.base_url(), "resolved configuration");
    let client = HttpTaskClient::new(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match command {
        Commands::Tui => tui::run(Arc::new(client), runtime.handle().clone()),
        Commands::List => runtime.block_on(commands::list(&client)),
        Commands::Add { title, description } => {
            runtime.block_on(commands::add(&client, title.join(" "), description.clone()))
        }
        Commands::Edit { id, title, description } => {
            runtime.block_on(commands::edit(&client, *id, title.clone(), description.clone()))
        }
        Commands::Toggle { id } => runtime.block_on(commands::toggle(&client, *id)),
        Commands::Rm { id } => runtime.block_on(commands::remove(&client, *id)),
    }
}
