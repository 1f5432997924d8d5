//! slashlock - Lock files behind a passphrase
//!
//! Usage:
//!   slashlock lock <file>      - Replace a file with a locked container
//!   slashlock unlock <file>    - Restore a locked file
//!   slashlock status <file>    - Check whether a passphrase opens a file
//!   slashlock config           - Show the effective configuration

use clap::{Parser, Subcommand};
use slashlock::{compression::Compression, Config, Error, Locker, Result, Unlockability};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "slashlock")]
#[command(author = "slashlock Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lock files behind a passphrase")]
struct Cli {
    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lock a file
    Lock {
        /// File to lock
        path: PathBuf,

        /// Write the container here instead of replacing the file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression algorithm (none, gzip, lz4)
        #[arg(long)]
        compression: Option<Compression>,

        /// Read passphrase from file
        #[arg(long)]
        password_file: Option<PathBuf>,
    },

    /// Unlock a file
    Unlock {
        /// Locked file
        path: PathBuf,

        /// Write the plaintext here instead of replacing the file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read passphrase from file
        #[arg(long)]
        password_file: Option<PathBuf>,
    },

    /// Check whether a passphrase unlocks a file
    Status {
        /// File to probe
        path: PathBuf,

        /// Read passphrase from file
        #[arg(long)]
        password_file: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write the defaults to the configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(Config::default_path);

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    if let Err(e) = run_command(cli.command, config, &config_path) {
        error!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Lock {
            path,
            output,
            compression,
            password_file,
        } => cmd_lock(config, &path, output, compression, password_file),

        Commands::Unlock {
            path,
            output,
            password_file,
        } => cmd_unlock(config, &path, output, password_file),

        Commands::Status {
            path,
            password_file,
        } => cmd_status(config, &path, password_file),

        Commands::Config { init } => cmd_config(&config, config_path, init),
    }
}

fn cmd_lock(
    mut config: Config,
    path: &Path,
    output: Option<PathBuf>,
    compression: Option<Compression>,
    password_file: Option<PathBuf>,
) -> Result<()> {
    if let Some(compression) = compression {
        config.lock.compression = compression;
    }
    let locker = Locker::new(config)?;

    let password = match password_file {
        Some(file) => read_password_file(&file)?,
        None => {
            let password = prompt("Enter passphrase: ")?;
            if prompt("Confirm passphrase: ")? != password {
                return Err(Error::InvalidInput("Passphrases do not match".to_string()));
            }
            password
        }
    };

    let container = match output {
        Some(output) => locker.lock_file(path, &output, &password)?,
        None => locker.lock(path, &password)?,
    };

    info!("Container size: {} bytes", container.len());
    Ok(())
}

fn cmd_unlock(
    config: Config,
    path: &Path,
    output: Option<PathBuf>,
    password_file: Option<PathBuf>,
) -> Result<()> {
    let locker = Locker::new(config)?;
    let password = get_password(password_file)?;

    let metadata = match output {
        Some(output) => locker.unlock_file(path, &output, &password)?,
        None => locker.unlock_in_place(path, &password)?,
    };

    if metadata.archive {
        info!("{} is an archive; extract it to recover its files", path.display());
    }
    Ok(())
}

fn cmd_status(config: Config, path: &Path, password_file: Option<PathBuf>) -> Result<()> {
    let locker = Locker::new(config)?;
    let password = get_password(password_file)?;

    match locker.is_unlockable(path, &password)? {
        Unlockability::Unlockable(metadata) => {
            println!("Locked: {}", path.display());
            println!("  Name:        {}", metadata.display_name());
            println!("  Size:        {} bytes", metadata.size);
            println!("  Compression: {}", metadata.compression);
            println!("  Archive:     {}", metadata.archive);
        }
        Unlockability::WrongPassphrase => {
            println!("Locked: {} (passphrase does not match)", path.display());
        }
        Unlockability::NotLocked => {
            println!("Not locked: {}", path.display());
        }
    }

    Ok(())
}

fn cmd_config(config: &Config, config_path: &Path, init: bool) -> Result<()> {
    if init {
        if config_path.exists() {
            return Err(Error::Config(format!(
                "Config file already exists: {}",
                config_path.display()
            )));
        }
        Config::default().save(config_path)?;
        info!("Wrote default configuration to {}", config_path.display());
        return Ok(());
    }

    println!("Config file: {}", config_path.display());
    println!(
        "{}",
        serde_json::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?
    );
    Ok(())
}

fn get_password(password_file: Option<PathBuf>) -> Result<String> {
    match password_file {
        Some(file) => read_password_file(&file),
        None => prompt("Enter passphrase: "),
    }
}

fn read_password_file(path: &Path) -> Result<String> {
    let password = std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidInput(format!("Failed to read password file: {}", e)))?;
    Ok(password.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn prompt(message: &str) -> Result<String> {
    rpassword::prompt_password(message).map_err(Error::Io)
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
