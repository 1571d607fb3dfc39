//! CLI entry point - the composition root.
//!
//! This is the ONLY place where infrastructure is wired together. Command
//! parsing stays deliberately thin: almost everything is env-var driven
//! (§1.1), since an operator pointing this at a carrier cares about
//! `PORT`/`PUBLIC_HOST`/provider keys, not flags.

mod bootstrap;
mod error;
mod memory_config_repo;
mod providers;
mod settings;

use clap::Parser;

use error::CliError;
use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "voice-cli", about = "Real-time voice-agent orchestrator server")]
struct Cli {
    /// Overrides PORT from the environment.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Allow CORS from any origin (default). Pass an origin to restrict it;
    /// repeat the flag for multiple allowed origins.
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(%err, "voice-cli exiting");
        std::process::exit(err.exit_code());
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(port) = cli.port {
        settings.port = port;
    }

    let deps = bootstrap::build_deps(&settings);
    let cors = if cli.cors_origins.is_empty() {
        voice_axum::CorsConfig::AllowAll
    } else {
        voice_axum::CorsConfig::AllowOrigins(cli.cors_origins)
    };
    let server_config = voice_axum::ServerConfig { port: settings.port, public_host: settings.public_host, cors };

    let state = voice_axum::bootstrap(deps, &server_config);
    voice_axum::start_server(state, &server_config).await.map_err(CliError::from)
}
