use chrono::{DateTime, Duration, Utc};

use crate::domain::{ItemCore, SourceItem};

/// Lookback window anchored at a fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub hours_back: u32,
    pub now: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(hours_back: u32, now: DateTime<Utc>) -> Self {
        Self { hours_back, now }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.now - Duration::hours(i64::from(self.hours_back))
    }

    /// Inclusive at the cutoff instant.
    pub fn contains(&self, published_at: DateTime<Utc>) -> bool {
        published_at >= self.cutoff()
    }
}

pub fn filter_window(items: Vec<SourceItem>, window: &TimeWindow) -> Vec<SourceItem> {
    items
        .into_iter()
        .filter(|item| window.contains(item.published_at()))
        .collect()
}
