use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use sunbeam::command::{Command, CommandInput, RemoteCommand, RootCommand};
use sunbeam::config::{self, Config, Dirs, LogFormat};
use sunbeam::schema::Page;
use sunbeam::{output, script};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "sunbeam")]
#[command(about = "Turn scripts into navigable launcher pages")]
#[command(long_about = "\
Turn scripts into navigable launcher pages

Any executable carrying a sunbeam header is a command. Static scripts print
plain text; interactive scripts print a JSON page (list, detail or form).

Script header:

  #!/bin/sh
  # @sunbeam.schemaVersion 1
  # @sunbeam.title Search Issues
  # @sunbeam.mode interactive                 # default: static
  # @sunbeam.packageName github               # default: parent directory
  # @sunbeam.argument1 {\"type\": \"text\", \"placeholder\": \"repo\"}

Scripts are discovered under SUNBEAM_SCRIPT_DIR, the script_dir config key,
or the platform data directory, in that order.

Run 'sunbeam gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Script root (overrides SUNBEAM_SCRIPT_DIR and config)
    #[arg(long, global = true)]
    script_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List discovered scripts
    List {
        /// Print the root page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a script or remote command and print the page it produces
    Run {
        /// Script path or http(s) URL
        target: String,
        /// Positional arguments passed to the command
        args: Vec<String>,
        /// Query fed to interactive commands
        #[arg(long, default_value = "")]
        query: String,
        /// Extra environment variable, KEY=VALUE (repeatable)
        #[arg(long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
        /// Print the page as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Check that a page document is well-formed (reads stdin without a file)
    Validate { file: Option<PathBuf> },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Cmd::List { json } => {
            let dirs = init_session(cli.script_dir)?;
            if json {
                let root = Command::Root(RootCommand::new(&dirs.scripts));
                let page = root.run(&CommandInput::default())?;
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                let scripts = script::scan_dir(&dirs.scripts)?;
                output::print_scripts(&scripts, &dirs.scripts);
            }
        }
        Cmd::Run {
            target,
            args,
            query,
            env,
            json,
        } => {
            let dirs = init_session(cli.script_dir)?;
            let command = if target.starts_with("http://") || target.starts_with("https://") {
                Command::Remote(RemoteCommand::new(Url::parse(&target)?))
            } else {
                let path = std::path::absolute(&target)?;
                let root = Command::Root(RootCommand::new(&dirs.scripts));
                Command::resolve(&path.to_string_lossy(), &root, &dirs)?
            };
            let input = CommandInput {
                environment: env.into_iter().collect(),
                arguments: args,
                query,
            };
            let page = command.run(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                output::print_page(&page);
            }
        }
        Cmd::Validate { file } => {
            let source = match &file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let page: Page = serde_json::from_str(&source)?;
            page.validate()?;
            println!("valid {} page", page.kind());
        }
        Cmd::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config, start logging and resolve directories. `--script-dir` wins
/// over everything else.
fn init_session(script_dir: Option<PathBuf>) -> Result<Dirs, Box<dyn std::error::Error>> {
    let config = config::load_default_config()?;
    init_tracing(&config);
    let mut dirs = config.resolve_dirs()?;
    if let Some(script_dir) = script_dir {
        dirs.scripts = script_dir;
    }
    debug!(scripts = %dirs.scripts.display(), data = %dirs.data.display(), "resolved directories");
    Ok(dirs)
}

/// Install the global subscriber. `RUST_LOG` wins over `log.level`.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    match config.log.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}
