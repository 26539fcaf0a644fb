use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hitched::api;

#[derive(Parser)]
#[command(name = "hitched", about = "Marriage bonus and penalty calculator", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API over HTTP.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Compare one couple's married and separate filings.
    Compare(api::CompareArgs),
    /// Render a bonus/penalty grid over an income range.
    Grid(api::GridArgs),
    /// Generate the built-in validation scenarios as JSON.
    Fixtures(api::FixturesArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "hitched=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve { port } => api::run_http_server(port).await.map_err(|e| e.to_string()),
        Command::Compare(args) => api::run_compare(&args),
        Command::Grid(args) => api::run_grid(&args),
        Command::Fixtures(args) => api::run_fixtures(&args),
    };

    if let Err(message) = result {
        error!("{message}");
        std::process::exit(1);
    }
}
