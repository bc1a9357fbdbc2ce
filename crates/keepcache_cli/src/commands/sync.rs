//! One-shot sync and the long-running daemon.

use std::sync::Arc;

use console::{Term, style};

use keepcache::remote::KeepClient;
use keepcache::sync::{CycleKind, CycleReport, Scheduler, Syncer};

use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::shutdown;

/// Validate the remote settings, then open the cache.
///
/// Configuration is checked first so a bad token never touches the database.
async fn build_syncer(
    config: &Config,
    database_url: &str,
) -> Result<Syncer, Box<dyn std::error::Error>> {
    let options = config.remote_settings()?;
    if options.accept_invalid_certs {
        tracing::warn!(url = %options.base_url, "TLS certificate validation is disabled");
    }
    let client = KeepClient::new(options)?;
    let db = keepcache::connect_and_migrate(database_url).await?;
    Ok(Syncer::new(db, Arc::new(client)))
}

/// Run a single cycle now.
pub(crate) async fn handle_sync(
    full: bool,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let syncer = build_syncer(config, database_url).await?;
    let kind = if full {
        CycleKind::Full
    } else {
        CycleKind::Incremental
    };

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let result = syncer.run_cycle(kind, Some(&callback)).await;
    reporter.finish();

    let report = result?;
    if Term::stdout().is_term() {
        display_summary(&report);
    }
    Ok(())
}

/// Run the scheduler until Ctrl+C.
pub(crate) async fn handle_daemon(
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config.sync.enabled {
        tracing::info!("Sync is disabled (sync.enabled = false), not starting the scheduler");
        return Ok(());
    }

    // Before any network or database work, so Ctrl+C is never fatal mid-cycle.
    let shutdown = shutdown::setup_shutdown_handler();

    let syncer = Arc::new(build_syncer(config, database_url).await?);
    let scheduler = Scheduler::new(syncer, config.sync_interval());

    tracing::info!(
        interval_minutes = config.sync.interval_minutes,
        max_retries = config.sync.max_retries,
        "Starting sync daemon"
    );

    let reporter = Arc::new(ProgressReporter::logging());
    let callback = reporter.as_callback();
    let cycles = scheduler
        .run(shutdown::shutdown_requested(shutdown), Some(&callback))
        .await;

    tracing::info!(cycles, "Sync daemon stopped");
    Ok(())
}

fn display_summary(report: &CycleReport) {
    println!();
    println!(
        "{} {} sync finished in {:.1}s",
        style("✓").green().bold(),
        report.kind,
        report.elapsed.as_secs_f64()
    );
    println!("  Lists:     {} cached, {} removed", report.lists_synced, report.lists_deleted);
    println!(
        "  Bookmarks: {} written, {} skipped, {} removed",
        report.bookmarks_written, report.bookmarks_skipped, report.bookmarks_deleted
    );
    if let Some(watermark) = report.watermark {
        println!(
            "  {}",
            style(format!("Bookmarks unchanged since {} were skipped", watermark.to_rfc3339())).dim()
        );
    }
}
