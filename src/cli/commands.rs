use crate::app::{AppContext, Result};

/// Outcome of a non-interactive update run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub refreshed: usize,
    pub failed: usize,
}

/// Refresh every configured feed, one after another, printing a line per
/// feed. Individual failures are counted, not returned.
pub async fn update_feeds(ctx: &AppContext) -> Result<UpdateSummary> {
    let feeds = ctx.sync_feeds()?;
    let mut summary = UpdateSummary::default();

    if feeds.is_empty() {
        println!("No feeds to update");
        return Ok(summary);
    }

    for mut feed in feeds {
        let result = ctx
            .refresher
            .refresh(ctx.store.as_ref(), &mut feed, &mut |m| tracing::info!("{m}"))
            .await;

        match result {
            Ok(report) => {
                summary.refreshed += 1;
                println!(
                    "{}: {} new, {} updated",
                    feed.name, report.merged.inserted, report.merged.updated
                );
            }
            Err(e) => {
                summary.failed += 1;
                println!("{}: failed ({})", feed.name, e);
            }
        }
    }

    Ok(summary)
}
