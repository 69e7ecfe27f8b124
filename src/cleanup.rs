//! Scheduled cleanup of blacklist rows whose tokens have expired anyway.

use crate::db::Database;
use crate::token::unix_now;
use std::time::Duration;
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database) {
    let Ok(now) = unix_now() else {
        error!("System clock unreadable, skipping cleanup");
        return;
    };

    match db.blacklist().delete_expired(now).await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired blacklist entries", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up blacklist: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}
