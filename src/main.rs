use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use linktracker::config::{get_config, init_config, init_config_from};
use linktracker::runtime::modes;
use linktracker::system::init_logging;

#[derive(Parser, Debug)]
#[command(name = "linktracker", version, about = "Link-tracking redirector")]
struct Cli {
    /// Path to a TOML configuration file (default: ./config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a sample configuration file
    GenerateConfig,
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Command::GenerateConfig) = cli.command {
        modes::generate_config();
        return ExitCode::SUCCESS;
    }

    match cli.config {
        Some(path) => {
            if let Err(e) = init_config_from(&path) {
                eprintln!("{}", e.format_colored());
                return ExitCode::FAILURE;
            }
        }
        None => init_config(),
    }

    let config = get_config();
    if let Err(e) = config.validate() {
        eprintln!("{}", e.format_colored());
        return ExitCode::FAILURE;
    }

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = modes::run_server(config).await {
        tracing::error!("{:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
