mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pidkeep_core::ExitHooks;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pidkeep")]
#[command(about = "Keep a pidfile for the lifetime of a process", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a pidfile and wait until interrupted or stdin closes
    Run {
        /// Pidfile path (defaults to the executable path with a .pid extension)
        #[arg(short, long)]
        pidfile: Option<PathBuf>,
        /// TOML configuration file with a [pidfile] section
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the pid stored in a pidfile and whether that process is alive
    Status {
        /// Pidfile path
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    match cli.command {
        Commands::Run { pidfile, config } => {
            // Dropped when this arm returns, which removes the pidfile
            let hooks = ExitHooks::new();
            commands::run::run_command(pidfile, config.as_deref(), &hooks).await
        }
        Commands::Status { path } => commands::status::status_command(&path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_pidfile() {
        let cli = Cli::try_parse_from(["pidkeep", "run", "--pidfile", "/tmp/x.pid"]).unwrap();
        match cli.command {
            Commands::Run { pidfile, config } => {
                assert_eq!(pidfile, Some(PathBuf::from("/tmp/x.pid")));
                assert!(config.is_none());
            }
            Commands::Status { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_status_requires_path() {
        assert!(Cli::try_parse_from(["pidkeep", "status"]).is_err());
        assert!(Cli::try_parse_from(["pidkeep", "status", "app.pid"]).is_ok());
    }
}
