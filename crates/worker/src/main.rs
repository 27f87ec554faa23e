use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scanboard_core::cache::ScanCache;
use scanboard_core::ingest::parse;
use scanboard_core::ingest::source::{ScanSource, SheetsSource};
use scanboard_core::sizing;
use scanboard_core::storage::snapshot::SnapshotStore;
use scanboard_core::storage::trackers::TrackerStore;

/// Scheduled refresh job. An external scheduler (cron) invokes this
/// periodically; it goes through the same cache entry point as any other
/// caller, so snapshot deduplication behaves identically.
#[derive(Debug, Parser)]
#[command(name = "scanboard_worker")]
struct Args {
    /// Fetch and parse but write neither cache state nor snapshots.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = scanboard_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let source = SheetsSource::from_settings(&settings)?;
    let trackers = TrackerStore::new(settings.data_dir());
    let sizing_settings = trackers.sizing_settings()?;

    if args.dry_run {
        let grid = source
            .fetch_raw_grid()
            .await
            .context("scan fetch failed")?;
        let record = parse::parse(&grid).context("scan parse failed")?;
        let record = sizing::annotate(&record, &sizing_settings);
        tracing::info!(
            dry_run = true,
            scan_time = %record.scan_time,
            regime = %record.regime,
            stocks = record.stocks.len(),
            "scan fetched (dry-run, nothing written)"
        );
        return Ok(());
    }

    let store = SnapshotStore::new(settings.history_dir());
    let cache = ScanCache::new(Arc::new(source), store, settings.cache_ttl());

    match cache.get_or_refresh(true, &sizing_settings).await {
        Ok(served) => {
            tracing::info!(
                scan_time = %served.record.scan_time,
                regime = %served.record.regime,
                stocks = served.record.stocks.len(),
                stale = served.stale,
                "scan refresh complete"
            );
            Ok(())
        }
        Err(err) => {
            let err = anyhow::Error::new(err).context("scan refresh failed");
            sentry_anyhow::capture_anyhow(&err);
            Err(err)
        }
    }
}

fn init_sentry(settings: &scanboard_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
