use anyhow::Context;
use innkeep_app::{app::wait_for_signal, App};
use innkeep_store::app_config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "innkeep=info,innkeep_app=info,innkeep_core=info,innkeep_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Starting booking expiry service, sweep every {}s",
        config.scheduler.interval_secs
    );

    let mut app = App::connect(&config)
        .await
        .context("Failed to initialise booking store")?;

    let outcome = app
        .run_until(wait_for_signal(tokio::signal::ctrl_c()))
        .await?;

    tracing::info!("Booking expiry service stopped ({:?})", outcome);
    Ok(())
}
