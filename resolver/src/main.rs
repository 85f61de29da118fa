//! Taskmerge Resolver - merges the base, local and remote copies of each
//! configured record set and commits the result.

use std::sync::Arc;

use taskmerge_resolver::{Config, ConflictResolver, FileStore, ResolverOptions};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskmerge_resolver=info,taskmerge_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        sets = config.record_sets.len(),
        "Starting taskmerge resolver"
    );

    let resolver = Arc::new(ConflictResolver::new(
        FileStore::new(config.data_dir.clone()),
        ResolverOptions {
            max_commit_attempts: config.max_commit_attempts,
            write_report: config.write_report,
        },
    ));

    let mut tasks = JoinSet::new();
    for set in config.record_sets.iter().cloned() {
        let resolver = Arc::clone(&resolver);
        tasks.spawn(async move {
            let result = resolver.resolve(&set).await;
            (set, result)
        });
    }

    let mut deferred = 0usize;
    while let Some(joined) = tasks.join_next().await {
        let (set, result) = joined?;
        match result {
            Ok(report) => {
                tracing::info!(
                    record_set = %set,
                    revision = report.revision,
                    records = report.record_count,
                    conflicts = report.summary.conflicts,
                    skipped_lines = report.skipped_lines.total(),
                    "Sync complete"
                );
            }
            Err(e) if e.is_transient() => {
                deferred += 1;
                tracing::warn!(record_set = %set, error = %e, "Sync deferred, will retry on next run");
            }
            Err(e) => {
                deferred += 1;
                tracing::error!(record_set = %set, error = %e, "Sync failed");
            }
        }
    }

    if deferred > 0 {
        return Err(format!("{} record set(s) not synchronized", deferred).into());
    }

    Ok(())
}
