use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::client::HolidazeApi;
use crate::engine::{AvailabilityService, subtract_ranges};
use crate::model::DayRange;

/// Ranges that became blocked and ranges that were released between two
/// rebuilds of the same venue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockedChanges {
    pub newly_blocked: Vec<DayRange>,
    pub released: Vec<DayRange>,
}

impl BlockedChanges {
    pub fn between(before: &[DayRange], after: &[DayRange]) -> Self {
        Self {
            newly_blocked: subtract_ranges(after, before),
            released: subtract_ranges(before, after),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.newly_blocked.is_empty() && self.released.is_empty()
    }
}

/// Periodically rebuild a venue's availability and log what changed.
/// Refresh failures are logged and retried on the next tick.
pub async fn run_watch<A: HolidazeApi>(service: Arc<AvailabilityService<A>>, venue_id: String, period: Duration) {
    let mut interval = tokio::time::interval(period);
    let mut previous: Option<Vec<DayRange>> = None;
    loop {
        interval.tick().await;
        let snapshot = match service.refresh(&venue_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("refresh of venue {venue_id} failed: {e}");
                continue;
            }
        };
        let current = snapshot.index.blocked_ranges().to_vec();
        match &previous {
            None => info!(
                "watching venue {venue_id}: {} blocked days",
                snapshot.index.blocked_day_count()
            ),
            Some(before) => {
                let changes = BlockedChanges::between(before, &current);
                for range in &changes.newly_blocked {
                    info!("venue {venue_id}: {} → {} now booked", range.first, range.last);
                }
                for range in &changes.released {
                    info!("venue {venue_id}: {} → {} released", range.first, range.last);
                }
            }
        }
        previous = Some(current);
    }
}
