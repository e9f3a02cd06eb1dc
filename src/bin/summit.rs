use clap::Parser;
use summitcare_api::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "summitcare_api=info".into()),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await
}
