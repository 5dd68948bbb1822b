use clap::{Parser, Subcommand};
use codestash::Result;
use codestash::commands::{check, serve, show_config};
use codestash::config::Config;

#[derive(Parser)]
#[command(name = "codestash")]
#[command(about = "A snippet vault with vector-grounded AI chat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,
    /// Check that every snippet record has a matching vector and vice versa
    Check,
    /// Inspect configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Serve => {
            serve(config).await?;
        }
        Commands::Check => {
            check(config).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config(&config)?;
            } else {
                println!(
                    "Edit {} to change configuration",
                    Config::config_file_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "the config file".to_string())
                );
            }
        }
    }

    Ok(())
}
