use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use deadline_bridge::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "deadline-bridge")]
#[command(about = "Submit publish jobs to the Deadline render farm and publish on farm events")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to .deadline-bridge/config.toml, then ~/.deadline-bridge/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit every deadlineData entry of a publish context to the farm
    Submit {
        /// Publish context JSON
        context: PathBuf,

        /// Directory containing deadlinecommand
        #[arg(long)]
        deadline_path: Option<PathBuf>,

        /// Directory for the job/plugin files
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        /// Give up on a single submission after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show the job and plugin files a submit would write, in submission order
    Plan {
        /// Publish context JSON
        context: PathBuf,
    },

    /// Turn the write nodes of an exported scene into publish instances
    Collect {
        /// Scene description JSON exported by the compositing host
        scene: PathBuf,

        /// Existing publish context to extend
        #[arg(long)]
        context: Option<PathBuf>,

        /// Add Draft post-processing settings
        #[arg(long)]
        draft: bool,

        /// Write the context here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Handle a farm lifecycle event (e.g. OnJobFinished)
    Event {
        /// Event name
        name: String,

        /// Farm job JSON exported by the event plugin
        #[arg(long)]
        job: Option<PathBuf>,

        /// Additional event data JSON (task and report for job errors)
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,

        /// Write a plain config with this deadlinecommand directory
        #[arg(long)]
        deadline_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init {
        force,
        deadline_path,
    } = cli.command
    {
        return cli::init::init_command(cli.config, force, deadline_path);
    }

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_dir(&std::env::current_dir()?)?,
    };

    match cli.command {
        Commands::Submit {
            context,
            deadline_path,
            temp_dir,
            timeout,
        } => {
            let overrides = cli::submit::CliSettings {
                deadline_path,
                temp_dir,
                timeout_secs: timeout,
            };
            cli::submit::submit_command(&context, config, overrides).await?;
        }
        Commands::Plan { context } => {
            cli::submit::plan_command(&context)?;
        }
        Commands::Collect {
            scene,
            context,
            draft,
            output,
        } => {
            cli::collect::collect_command(
                &scene,
                context.as_deref(),
                draft,
                output.as_deref(),
                &config,
            )?;
        }
        Commands::Event { name, job, data } => {
            cli::event::event_command(&name, job.as_deref(), data.as_deref(), &config).await?;
        }
        Commands::Init { .. } => {}
    }

    Ok(())
}
