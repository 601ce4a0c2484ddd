//! Notification badge kept current from the change feed.

use crate::config::CoreConfig;
use crate::constants::{BADGE_COUNT_CAP, BADGE_REFRESH_INTERVAL_SECS};
use crate::notifications::{fetch_notifications, Notification};
use crate::store::{ChangeFeed, EventMask, RecordStore, Subscription, Table};
use crate::view::ViewSlot;
use crate::WardResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Tables whose mutations can change the notification feed.
pub const WATCHED_TABLES: &[Table] = &[Table::Patients, Table::Appointments, Table::Admissions];

/// Text of the badge: nothing when empty, the count up to nine, then "9+".
pub fn badge_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_COUNT_CAP => Some(format!("{}+", BADGE_COUNT_CAP)),
        n => Some(n.to_string()),
    }
}

pub struct BadgeRefresher {
    store: Arc<dyn RecordStore>,
    cfg: Arc<CoreConfig>,
    slot: Arc<ViewSlot<Vec<Notification>>>,
    period: Duration,
}

impl BadgeRefresher {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            store,
            cfg,
            slot: Arc::new(ViewSlot::new()),
            period: Duration::from_secs(BADGE_REFRESH_INTERVAL_SECS),
        }
    }

    /// Recompute at least this often, even without changes.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// The feed as last computed. Shared with readers such as the REST layer.
    pub fn slot(&self) -> Arc<ViewSlot<Vec<Notification>>> {
        Arc::clone(&self.slot)
    }

    pub fn badge(&self) -> Option<String> {
        badge_label(self.slot.current().map_or(0, |feed| feed.len()))
    }

    /// Recompute the feed and publish it unless a newer refresh overtook this one.
    pub async fn refresh(&self) -> WardResult<usize> {
        let ticket = self.slot.begin();
        let feed = fetch_notifications(self.store.as_ref(), self.cfg.now()).await?;
        let count = feed.len();
        self.slot.publish(ticket, feed);
        Ok(count)
    }

    /// Refresh once, then again after every change and on every tick, until the
    /// subscription ends.
    pub async fn run(self, mut changes: Subscription) {
        self.refresh_logged().await;
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                event = changes.next() => match event {
                    Some(event) => {
                        tracing::debug!("badge refresh on {:?} {}", event.kind, event.table);
                    }
                    None => break,
                },
                _ = ticker.tick() => tracing::trace!("badge refresh on tick"),
            }
            self.refresh_logged().await;
        }
        tracing::info!("change feed closed, badge refresher stopping");
        self.slot.close();
    }

    async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!("badge refresh failed: {}", e);
        }
    }

    /// Subscribe to the watched tables and run in the background.
    pub fn spawn(self, feed: &dyn ChangeFeed) -> JoinHandle<()> {
        let changes = feed.subscribe(WATCHED_TABLES, EventMask::ALL);
        tokio::spawn(self.run(changes))
    }
}
