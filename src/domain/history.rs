use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ItemId;

/// Maximum number of entries kept. Older entries are dropped first.
pub const HISTORY_CAPACITY: usize = 2000;

const DAY_MS: i64 = 86_400_000;

/// What happened to an item at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// The item was shown.
    #[default]
    Drawn,
    /// The item was marked as done.
    Done,
    /// The item was passed over.
    Skipped,
}

/// A terminal action that finalizes a shown item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Mark as done.
    Done,
    /// Mark as skipped.
    Skipped,
}

impl From<Outcome> for Action {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => Self::Done,
            Outcome::Skipped => Self::Skipped,
        }
    }
}

/// A single pick event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// The item this event refers to. May no longer exist in the catalog.
    pub id: ItemId,
    /// When the event happened.
    #[serde(rename = "t", with = "chrono::serde::ts_milliseconds")]
    pub at: DateTime<Utc>,
    /// What happened.
    #[serde(default)]
    pub action: Action,
    /// Set when a `drawn` entry was later finalized as done.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub done_at: Option<DateTime<Utc>>,
    /// Set when a `drawn` entry was later finalized as skipped.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub skipped_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    /// Creates an entry with no finalization stamps.
    #[must_use]
    pub const fn new(id: ItemId, action: Action, at: DateTime<Utc>) -> Self {
        Self {
            id,
            at,
            action,
            done_at: None,
            skipped_at: None,
        }
    }

    /// Whether this is a `drawn` entry still waiting for a done/skip.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.action, Action::Drawn) && self.done_at.is_none() && self.skipped_at.is_none()
    }
}

/// The ordered log of pick events, oldest first.
///
/// The log is capped at [`HISTORY_CAPACITY`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from entries ordered oldest first.
    ///
    /// Only the most recent [`HISTORY_CAPACITY`] entries are kept.
    pub fn from_entries(entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let mut history = Self {
            entries: entries.into_iter().collect(),
        };
        history.truncate();
        history
    }

    /// Appends an event, evicting the oldest entries beyond capacity.
    pub fn append(&mut self, id: ItemId, action: Action, at: DateTime<Utc>) {
        self.entries.push_back(HistoryEntry::new(id, action, at));
        self.truncate();
    }

    /// Finalizes the most recent entry in place, or appends a new one.
    ///
    /// When the last entry is a pending `drawn` entry for `id`, its action is
    /// replaced and the matching `done_at`/`skipped_at` is stamped. This keeps
    /// a single occasion from being counted as both drawn and done.
    ///
    /// Returns `true` if an entry was updated in place, `false` if a new entry
    /// was appended instead.
    pub fn finalize(&mut self, id: &ItemId, outcome: Outcome, at: DateTime<Utc>) -> bool {
        match self.entries.back_mut() {
            Some(last) if last.id == *id && last.is_pending() => {
                last.action = outcome.into();
                match outcome {
                    Outcome::Done => last.done_at = Some(at),
                    Outcome::Skipped => last.skipped_at = Some(at),
                }
                true
            }
            _ => {
                self.append(id.clone(), outcome.into(), at);
                false
            }
        }
    }

    /// Removes and returns the most recent entry.
    pub fn remove_last(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    /// Removes every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// The most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// All distinct ids with an event at or after `now - days`.
    #[must_use]
    pub fn recent_ids_within_window(&self, days: u32, now: DateTime<Utc>) -> HashSet<ItemId> {
        let cutoff = now.timestamp_millis() - i64::from(days) * DAY_MS;
        self.entries
            .iter()
            .filter(|entry| entry.at.timestamp_millis() >= cutoff)
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Up to `count` distinct ids, most recent first.
    ///
    /// Repeated picks of the same item count once, so this walks as far back
    /// as needed to find `count` different items.
    #[must_use]
    pub fn most_recent_distinct_ids(&self, count: usize) -> Vec<ItemId> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for entry in self.entries.iter().rev() {
            if ids.len() >= count {
                break;
            }
            if seen.insert(&entry.id) {
                ids.push(entry.id.clone());
            }
        }
        ids
    }

    fn truncate(&mut self) {
        let excess = self.entries.len().saturating_sub(HISTORY_CAPACITY);
        self.entries.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn history(ids: &[&str]) -> History {
        let mut history = History::new();
        for (i, id) in ids.iter().enumerate() {
            history.append(ItemId::new(*id), Action::Drawn, at(i as i64));
        }
        history
    }

    #[test]
    fn append_caps_at_capacity() {
        let mut history = History::new();
        for i in 0..=HISTORY_CAPACITY {
            history.append(ItemId::new(format!("item-{i}")), Action::Done, at(i as i64));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().id.as_str(), "item-1");
        assert_eq!(
            history.last().unwrap().id.as_str(),
            format!("item-{HISTORY_CAPACITY}")
        );
        let times: Vec<_> = history.iter().map(|e| e.at.timestamp_millis()).collect();
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn from_entries_keeps_most_recent() {
        let entries = (0..HISTORY_CAPACITY + 5)
            .map(|i| HistoryEntry::new(ItemId::new(format!("{i}")), Action::Drawn, at(i as i64)));
        let history = History::from_entries(entries);

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().id.as_str(), "5");
    }

    #[test]
    fn finalize_updates_pending_entry_in_place() {
        let mut history = history(&["a"]);

        let updated = history.finalize(&ItemId::new("a"), Outcome::Done, at(50));

        assert!(updated);
        assert_eq!(history.len(), 1);
        let last = history.last().unwrap();
        assert_eq!(last.action, Action::Done);
        assert_eq!(last.done_at, Some(at(50)));
        assert_eq!(last.at, at(0));
    }

    #[test]
    fn finalize_appends_when_last_entry_is_another_item() {
        let mut history = history(&["a", "b"]);

        let updated = history.finalize(&ItemId::new("a"), Outcome::Skipped, at(50));

        assert!(!updated);
        assert_eq!(history.len(), 3);
        assert_eq!(history.last().unwrap().action, Action::Skipped);
    }

    #[test]
    fn finalize_does_not_refinalize() {
        let mut history = history(&["a"]);
        history.finalize(&ItemId::new("a"), Outcome::Done, at(10));

        let updated = history.finalize(&ItemId::new("a"), Outcome::Skipped, at(20));

        assert!(!updated);
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().next().unwrap().action, Action::Done);
    }

    #[test]
    fn remove_last_on_empty_history_is_noop() {
        let mut history = History::new();
        assert_eq!(history.remove_last(), None);
        assert!(history.is_empty());
    }

    #[test]
    fn remove_last_pops_most_recent() {
        let mut history = history(&["a", "b"]);
        assert_eq!(history.remove_last().unwrap().id.as_str(), "b");
        assert_eq!(history.last().unwrap().id.as_str(), "a");
    }

    #[test]
    fn reset_clears_everything() {
        let mut history = history(&["a", "b"]);
        history.reset();
        assert!(history.is_empty());
    }

    #[test]
    fn window_includes_entries_at_or_after_cutoff() {
        let now = Utc::now();
        let mut history = History::new();
        history.append(ItemId::new("old"), Action::Done, now - TimeDelta::days(8));
        history.append(ItemId::new("edge"), Action::Done, now - TimeDelta::days(7));
        history.append(ItemId::new("new"), Action::Drawn, now - TimeDelta::hours(1));

        let ids = history.recent_ids_within_window(7, now);

        assert!(!ids.contains("old"));
        assert!(ids.contains("edge"));
        assert!(ids.contains("new"));
    }

    #[test]
    fn distinct_ids_skip_repeats_and_keep_recency_order() {
        let history = history(&["a", "b", "a", "c", "c"]);

        let ids = history.most_recent_distinct_ids(3);

        let ids: Vec<_> = ids.iter().map(ItemId::as_str).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn distinct_ids_with_zero_count_is_empty() {
        assert!(history(&["a"]).most_recent_distinct_ids(0).is_empty());
    }

    #[test]
    fn entries_serialize_with_millisecond_timestamps() {
        let mut history = history(&["a"]);
        history.finalize(&ItemId::new("a"), Outcome::Done, at(42));

        let json = serde_json::to_value(&history).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{ "id": "a", "t": 0, "action": "done", "doneAt": 42 }])
        );
    }
}
