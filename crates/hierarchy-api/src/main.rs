use hierarchy_api::Server;
use hierarchy_core::Settings;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("hierarchy_api={0},hierarchy_graph={0},tower_http=info", settings.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(
        config_dir = ?Settings::default_config_dir(),
        env = %Settings::default_env(),
        "Configuration loaded"
    );

    Server::new(settings).await?.run().await
}
