//! Serves the tools and prompts from a configuration file in-process.
//!
//! ```text
//! shell-tools list
//! shell-tools call git-log count=3
//! shell-tools prompt commit-message diff="$(git diff)"
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cmdforge::config::{ConfigSource, load};
use cmdforge::primitives::Arguments;
use cmdforge::registry::{LocalDispatcher, Registry, register};
use tracing::info;

const SAMPLE_CONFIG: &str = include_str!("../shell-tools.yaml");

#[derive(Parser)]
#[command(about = "Run declaratively configured shell tools and prompts")]
struct Cli {
    /// Configuration file; falls back to CMDFORGE_CONFIG_PATH, CMDFORGE_CONFIG_VALUE,
    /// then the bundled sample.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every tool and prompt with its description.
    List,
    /// Invoke a tool.
    Call {
        /// Tool name.
        name: String,
        /// Arguments as key=value pairs.
        args: Vec<String>,
    },
    /// Render a prompt.
    Prompt {
        /// Prompt name.
        name: String,
        /// Arguments as key=value pairs.
        args: Vec<String>,
    },
}

fn parse_arguments(pairs: &[String]) -> Result<Arguments> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .with_context(|| format!("argument `{pair}` is not in key=value form"))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    cmdforge::telemetry::init_tracing("shell_tools=info,forge_config=info")?;
    let cli = Cli::parse();

    let source = cli
        .config
        .map(ConfigSource::Path)
        .or_else(ConfigSource::from_env)
        .unwrap_or_else(|| ConfigSource::Yaml(SAMPLE_CONFIG.to_owned()));

    let config = load(&source).context("failed to load configuration")?;
    let registry = Registry::from_config(config)?;
    let mut dispatcher = LocalDispatcher::new();
    let exposed = register(&registry, &mut dispatcher)?;
    info!(handlers = exposed, "dispatcher ready");

    match cli.command {
        Command::List => {
            for tool in dispatcher.tools() {
                println!("== tool: {}\n{}\n", tool.name, tool.description);
            }
            for prompt in dispatcher.prompts() {
                println!("== prompt: {}\n{}\n", prompt.name, prompt.description);
            }
        }
        Command::Call { name, args } => {
            let output = dispatcher.call_tool(&name, parse_arguments(&args)?).await?;
            print!("{output}");
            if output.starts_with("Error") {
                bail!("tool `{name}` failed");
            }
        }
        Command::Prompt { name, args } => {
            println!("{}", dispatcher.get_prompt(&name, &parse_arguments(&args)?)?);
        }
    }

    Ok(())
}
