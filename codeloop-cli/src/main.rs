//! Codeloop CLI - Command line interface for codeloop
//!
//! Generates a Python function with a coder agent, tests it, retries on
//! failure and documents the result.

mod commands;

use clap::{Parser, Subcommand};
use codeloop_core::agent::BackendRegistry;
use codeloop_core::config::{Backend, CliOverrides};
use codeloop_core::{Config, TesterMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{CheckArgs, SolveArgs};

/// Codeloop: write, test and document a function with agents
#[derive(Parser, Debug)]
#[command(name = "codeloop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Agent backend: claude or cursor (overrides config and env)
    #[arg(long, global = true, env = "CODELOOP_BACKEND")]
    backend: Option<Backend>,

    /// Path to claude executable (overrides config and env)
    #[arg(long, global = true, env = "CODELOOP_CLAUDE_PATH")]
    claude_path: Option<String>,

    /// Model to use (overrides config and env)
    #[arg(long, global = true, env = "CODELOOP_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Implement, test and document a function
    #[command(visible_alias = "s")]
    Solve {
        #[command(flatten)]
        args: SolveArgs,

        /// Maximum Testing -> Coding retries (overrides config and env)
        #[arg(long)]
        max_retries: Option<u32>,

        /// How tests are judged: pytest or model (overrides config)
        #[arg(long)]
        tester: Option<TesterMode>,
    },

    /// Clean a Python file and check that it defines a function
    Check(CheckArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let (max_retries, tester) = match &cli.command {
        Some(Commands::Solve {
            max_retries,
            tester,
            ..
        }) => (*max_retries, *tester),
        _ => (None, None),
    };

    // Load configuration with overrides
    let config = Config::load_with_overrides(CliOverrides {
        backend: cli.backend,
        claude_path: cli.claude_path.clone(),
        model: cli.model.clone(),
        max_retries,
        tester,
    })?;

    if cli.verbose {
        tracing::info!(
            backend = ?config.agent.backend,
            claude_path = %config.agent.claude_path,
            model = ?config.agent.model,
            max_retries = config.workflow.max_retries,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("codeloop {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Solve { args, .. }) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Check(args)) => {
            args.execute(cli.verbose)?;
        }
        Some(Commands::Config) => {
            println!("Codeloop Configuration");
            println!("======================");
            println!();
            println!("Agent Settings:");
            println!("  backend: {:?}", config.agent.backend);
            println!("  claude_path: {}", config.agent.claude_path);
            println!("  cursor_path: {}", config.agent.cursor_path);
            println!("  model: {}", config.agent.model.as_deref().unwrap_or("(default)"));
            println!();
            println!("Backends:");
            for (name, available) in BackendRegistry::with_config(&config.agent).availability() {
                let status = if available { "available" } else { "not found" };
                println!("  {}: {}", name, status);
            }
            println!();
            println!("Workflow Settings:");
            println!("  max_retries: {}", config.workflow.max_retries);
            println!("  tester: {:?}", config.workflow.tester);
            println!("  python: {}", config.workflow.python);
            println!("  test_timeout: {:?}", config.workflow.test_timeout);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Codeloop - write, test and document a function with agents");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
