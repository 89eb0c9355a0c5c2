use jobs_eng::{config::Config, run_server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to load .env: {e}");
    }
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(
        backend = ?config.store_backend,
        port = config.port,
        "Loaded configuration"
    );

    run_server(config).await
}
