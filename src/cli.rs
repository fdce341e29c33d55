//! CLI entry for munin: resolve the configuration, set up logging and run the
//! shell against an in-process bot.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::internal::{
    bot::{Bot, LocalBot},
    config::{ShellConfig, load_config_file, load_shell_config},
    control::{Control, LineReader, ScriptReader, StdinReader},
    plugin::{PluginStore, import_plugins},
};

#[derive(Parser, Debug)]
#[command(about = "munin: administration shell for a chat bot", version)]
pub struct Cli {
    /// Configuration file, instead of the project or user one
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub prompt: Option<String>,

    /// Directory holding the plugins' persistent data
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Nick of the bot
    #[arg(long)]
    pub nick: Option<String>,

    /// Read commands from a file instead of the terminal
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The configuration file (or defaults) with command-line overrides applied.
    pub fn resolve_config(&self) -> anyhow::Result<ShellConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => load_shell_config(&std::env::current_dir()?),
        };
        if let Some(prompt) = &self.prompt {
            config.prompt = prompt.clone();
        }
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(nick) = &self.nick {
            config.nick = nick.clone();
        }
        Ok(config)
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins over `--verbose`, which wins over the configured level.
pub fn init_tracing(verbose: bool, log_level: Option<&str>) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(log_level.unwrap_or("warn")).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // a subscriber may already be installed by an embedding program
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse the command line and run the shell until it quits.
/// - `args`: parse from command line if it's `None`, otherwise parse from the given args
pub fn parse(args: Option<&[&str]>) -> anyhow::Result<()> {
    let cli = match args {
        Some(args) => Cli::try_parse_from(args)?,
        None => Cli::parse(),
    };
    let config = cli.resolve_config()?;
    init_tracing(cli.verbose, config.log_level.as_deref());

    let script = match &cli.script {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("cannot read script {}", path.display()))?,
        ),
        None => None,
    };
    run(config, script)
}

fn run(config: ShellConfig, script: Option<String>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run_async(config, script));
    // a pending stdin read cannot be cancelled, do not wait for it
    runtime.shutdown_background();
    result
}

/// `async` version of [run]: build the bot and its plugins, then drive the
/// shell from `script` if given, from the terminal otherwise.
pub async fn run_async(config: ShellConfig, script: Option<String>) -> anyhow::Result<()> {
    match script {
        Some(script) => drive(&config, ScriptReader::from_script(&script).with_echo(true)).await,
        None => drive(&config, StdinReader::new()?).await,
    }
}

async fn drive<R: LineReader>(config: &ShellConfig, reader: R) -> anyhow::Result<()> {
    let store = PluginStore::new(&config.data_dir);
    let plugins = import_plugins(&config.plugins, &store);
    tracing::info!(
        data_dir = %store.data_dir().display(),
        "{} plugin(s) imported",
        plugins.len()
    );
    let bot = LocalBot::new(config.nick.clone());
    for nick in &config.sudoers {
        bot.add_sudoer(nick);
    }

    let mut control = Control::new(
        bot,
        plugins,
        reader,
        std::io::stdout(),
        config.control_options(),
    )?;
    control.run().await?;
    Ok(())
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;

    Cli::command().debug_assert()
}
