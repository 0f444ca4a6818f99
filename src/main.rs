use std::sync::Arc;

use anyhow::Context;

use health_intake::catalog::Catalog;
use health_intake::channels::CliWizard;
use health_intake::config::IntakeConfig;
use health_intake::error::Result;
use health_intake::onboarding::{OnboardingIntent, OnboardingManager, OnboardingSession};
use health_intake::store::{KeyValueStore, LibSqlStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = IntakeConfig::from_env();
    config.validate().context("invalid configuration")?;

    eprintln!("Health Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   DB: {}", config.db_path.display());

    let manager = Arc::new(
        build_manager(&config)
            .await
            .context("failed to start onboarding")?,
    );

    // Surface any profile left by a previous run in the logs.
    manager.dispatch(OnboardingIntent::Load).await?;

    CliWizard::new(Arc::clone(&manager)).run_stdio().await?;

    let session = manager.snapshot().await;
    if !session.is_completed() {
        tracing::info!(step = session.current_step(), "Onboarding left unfinished");
    }
    Ok(())
}

/// Load the catalog, open the store and seed a fresh session.
async fn build_manager(config: &IntakeConfig) -> Result<OnboardingManager> {
    let catalog = Catalog::load(config).await?;
    let store: Arc<dyn KeyValueStore> = Arc::new(LibSqlStore::new_local(&config.db_path).await?);
    Ok(OnboardingManager::new(
        store,
        Arc::new(catalog),
        OnboardingSession::from_config(config),
    ))
}
