//! Cofre horizon scheduler
//!
//! Tops up every active recurring account and income up to its rolling
//! horizon, logs what is overdue or due soon, then exits. Meant to run from
//! cron; a second run on the same day creates nothing.

use chrono::Days;
use cofre_core::aggregation::AggregationService;
use cofre_core::{Clock, SystemClock};
use cofre_db::{LedgerRepository, ObligationRepository, connect_with};
use cofre_shared::{AppConfig, AppError};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(AppError::from)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let clock = SystemClock::in_zone(config.ledger.tz().map_err(AppError::from)?);
    let today = clock.today();

    let report = ObligationRepository::new(db.clone())
        .top_up_horizons(today)
        .await
        .map_err(AppError::from)?;

    // Each failure was already logged by the repository.
    if !report.failures.is_empty() {
        anyhow::bail!("{} parent(s) failed to top up on {today}", report.failures.len());
    }

    info!(
        %today,
        extended = report.parents_extended,
        created = report.drafts_created,
        "Horizon top-up complete"
    );

    let days = config.ledger.upcoming_days;
    let until = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(today);
    let pending = LedgerRepository::new(db)
        .pending_due_by(until)
        .await
        .map_err(AppError::from)?;
    info!(
        overdue = AggregationService::overdue(&pending, today).len(),
        upcoming = AggregationService::upcoming_due(&pending, today, days).len(),
        days,
        "Due-date summary"
    );
    Ok(())
}
