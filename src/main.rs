use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pathstore::config::AppConfig;
use pathstore::{HierarchicalStore, LocalStore, PathStorage};

#[derive(Parser)]
#[command(name = "pathstore")]
#[command(about = "Path-addressable file operations over a folder tree")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./pathstore.toml")]
    config: PathBuf,

    /// Storage root directory (overrides config)
    #[arg(long)]
    root_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a folder and any missing parents
    Mkdir {
        /// Folder path, e.g. "reports/2024"
        path: String,
    },

    /// Check whether a file exists
    Exists {
        path: String,
    },

    /// Show where a file lives
    Stat {
        path: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a file's content
    Cat {
        path: String,
    },

    /// Move or rename a file; the destination folder must exist
    Mv {
        from: String,
        to: String,
    },

    /// Create a file from --content, --from-file or stdin
    Put {
        path: String,

        /// Literal content
        #[arg(long, conflicts_with = "from_file")]
        content: Option<String>,

        /// Read content from a local file
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Print an unused temporary file name
    TempName,

    /// Print the effective configuration
    ShowConfig,
}

#[derive(Serialize)]
struct FileInfo {
    path: String,
    name: String,
    folder: String,
    size: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(root_dir) = cli.root_dir {
        config.root_dir = root_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.json_logs |= cli.json_logs;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Starting pathstore v{}", env!("CARGO_PKG_VERSION"));

    let open_storage = || -> Result<PathStorage<LocalStore>> {
        let store = LocalStore::open(&config.root_dir)
            .with_context(|| format!("Failed to open storage root {:?}", config.root_dir))?;
        Ok(PathStorage::with_options(store, config.storage.clone()))
    };

    match cli.command {
        Commands::Mkdir { path } => {
            let folder = open_storage()?.create_folder_recursively(&path)?;
            println!("{}", folder.display());
        }

        Commands::Exists { path } => {
            println!("{}", open_storage()?.file_exists(&path)?);
        }

        Commands::Stat { path, json } => {
            let storage = open_storage()?;
            let (folder, file) = storage.locate(&path)?;
            let store = storage.store();
            let info = FileInfo {
                name: store.file_name(&file)?,
                folder: store.folder_name(&folder)?,
                size: store.file_size(&file)?,
                path,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Path:   {}", info.path);
                println!("Name:   {}", info.name);
                println!("Folder: {}", info.folder);
                println!("Size:   {} bytes", info.size);
            }
        }

        Commands::Cat { path } => {
            let storage = open_storage()?;
            let file = storage.file(&path)?;
            let content = storage.store().read_file(&file)?;
            std::io::stdout()
                .write_all(&content)
                .context("Failed to write to stdout")?;
        }

        Commands::Mv { from, to } => {
            let file = open_storage()?.move_file(&from, &to)?;
            println!("{}", file.display());
        }

        Commands::Put {
            path,
            content,
            from_file,
        } => {
            let bytes = match (content, from_file) {
                (Some(content), _) => content.into_bytes(),
                (None, Some(source)) => std::fs::read(&source)
                    .with_context(|| format!("Failed to read {:?}", source))?,
                (None, None) => {
                    let mut buf = Vec::new();
                    std::io::stdin()
                        .read_to_end(&mut buf)
                        .context("Failed to read stdin")?;
                    buf
                }
            };

            let file = open_storage()?.create_file(&path, &bytes)?;
            println!("{}", file.display());
        }

        Commands::TempName => {
            println!("{}", open_storage()?.temp_file_name()?);
        }

        Commands::ShowConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
