pub mod bridge;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod fs;
pub mod host;
pub mod media;
pub mod protocol;
pub mod registry;
pub mod scanner;
pub mod session;
pub mod terminal;
pub mod view;

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::bridge::Bridge;
use crate::config::Config;
use crate::fs::DiskFs;
use crate::registry::Registry;
use crate::terminal::Terminal;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "imgnav", version = VERSION, about = "Step through the images of a folder")]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Speak JSON lines on stdin/stdout instead of the terminal prompt
    #[arg(long)]
    bridge: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Images to open, one view each
    #[arg(trailing_var_arg = true)]
    paths: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the sorted image list of a directory
    List { dir: PathBuf },
    /// Print version and build hash
    Version,
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Some(Commands::Version) => {
            println!("imgnav {}", VERSION);
            return Ok(());
        }
        Some(Commands::List { dir }) => {
            let images = scanner::list_images(&DiskFs, &dir)
                .with_context(|| format!("cannot list {}", dir.display()))?;
            for path in images {
                println!("{}", path.display());
            }
            return Ok(());
        }
        None => {}
    }

    let config = Config::load(cli.config.as_deref());
    debug!(?config, "config loaded");
    let registry = Arc::new(Registry::new(DiskFs, config.zoom));

    if cli.bridge {
        let bridge = Arc::new(Bridge::new(io::stdout()));
        for path in &cli.paths {
            registry.open(path, &*bridge);
        }
        bridge.run(&registry, io::stdin().lock())?;
        return Ok(());
    }

    let term = Terminal::new(BufReader::new(io::stdin()), io::stdout(), &config);
    for path in &cli.paths {
        registry.open(path, &term);
    }
    if registry.is_empty() {
        bail!("nothing to show (pass one or more image paths)");
    }
    term.run(&registry)?;
    Ok(())
}
