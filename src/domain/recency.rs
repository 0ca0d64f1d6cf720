use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{History, ItemId};

/// The two independent "avoid repeats" thresholds.
///
/// An item is recent when it was picked within the last `days` days, or when
/// it is among the last `count` distinct picks. A threshold of zero disables
/// that signal only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvoidPolicy {
    /// Size of the time window, in days.
    pub days: u32,
    /// Number of most recent distinct picks.
    pub count: usize,
}

impl AvoidPolicy {
    /// Creates a policy from the two thresholds.
    #[must_use]
    pub const fn new(days: u32, count: usize) -> Self {
        Self { days, count }
    }

    /// The union of ids caught by either threshold.
    #[must_use]
    pub fn avoid_set(&self, history: &History, now: DateTime<Utc>) -> HashSet<ItemId> {
        let mut ids = if self.days == 0 {
            HashSet::new()
        } else {
            history.recent_ids_within_window(self.days, now)
        };
        ids.extend(history.most_recent_distinct_ids(self.count));
        ids
    }
}
