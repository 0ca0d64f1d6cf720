use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::domain::{Action, AvoidPolicy, History, HistoryEntry, ItemId, Outcome};

/// How the current item came to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShownVia {
    /// A committing draw. The pointer moved and a `drawn` entry was written.
    Draw,
    /// A peek at the given deck slot. Nothing was written.
    Peek {
        /// The deck slot the item was shown from.
        index: usize,
    },
    /// Picked directly from the catalog, outside deck order.
    Library,
}

/// The item currently on show, with its history bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Current {
    /// The item shown.
    pub id: ItemId,
    /// How it was shown.
    pub via: ShownVia,
    has_entry: bool,
    pending: bool,
}

impl Current {
    fn shown(id: ItemId, via: ShownVia, history: &History) -> Self {
        let last = history.last().filter(|entry| entry.id == id);
        Self {
            has_entry: last.is_some(),
            pending: last.is_some_and(HistoryEntry::is_pending),
            id,
            via,
        }
    }

    /// Whether the most recent history entry belongs to this item.
    #[must_use]
    pub const fn has_entry(&self) -> bool {
        self.has_entry
    }

    /// Whether that entry is a `drawn` entry still waiting for a done/skip.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Everything a deck rebuild depends on besides the history.
#[derive(Debug, Clone, Copy)]
pub struct DeckInputs<'a> {
    /// Ids of the items passing the active filters.
    pub candidates: &'a [ItemId],
    /// The "avoid repeats" thresholds.
    pub policy: AvoidPolicy,
    /// The instant used for time windows and new history entries.
    pub now: DateTime<Utc>,
}

/// Sequences draws over a shuffled deck of candidates.
///
/// The deck puts every candidate that is not recent ahead of every candidate
/// that is, each run in random order. Drawing past the end rebuilds the deck
/// against the history as it stands at that moment.
#[derive(Debug, Clone)]
pub struct Scheduler {
    deck: Vec<ItemId>,
    pointer: Option<usize>,
    current: Option<Current>,
    rng: StdRng,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates an empty scheduler seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty scheduler with a fixed seed, for reproducible decks.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    const fn with_rng(rng: StdRng) -> Self {
        Self {
            deck: Vec::new(),
            pointer: None,
            current: None,
            rng,
        }
    }

    /// The current deck order.
    #[must_use]
    pub fn deck(&self) -> &[ItemId] {
        &self.deck
    }

    /// Index of the last slot consumed by a committing draw.
    #[must_use]
    pub const fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    /// The item on show, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Current> {
        self.current.as_ref()
    }

    /// Reshuffles the deck from the candidates and resets the pointer.
    pub fn rebuild(&mut self, history: &History, inputs: &DeckInputs<'_>) {
        let avoid = inputs.policy.avoid_set(history, inputs.now);
        let (mut recent, mut fresh): (Vec<_>, Vec<_>) = inputs
            .candidates
            .iter()
            .cloned()
            .partition(|id| avoid.contains(id));

        fresh.shuffle(&mut self.rng);
        recent.shuffle(&mut self.rng);

        tracing::debug!(
            fresh = fresh.len(),
            recent = recent.len(),
            "Rebuilt deck"
        );

        fresh.append(&mut recent);
        self.deck = fresh;
        self.pointer = None;
    }

    /// Shows the next item and records it as drawn.
    ///
    /// Returns `None` when no candidate matches, leaving the history alone.
    pub fn draw(&mut self, history: &mut History, inputs: &DeckInputs<'_>) -> Option<ItemId> {
        let index = self.next_slot(self.pointer, history, inputs)?;
        let id = self.deck[index].clone();

        self.pointer = Some(index);
        history.append(id.clone(), Action::Drawn, inputs.now);
        self.current = Some(Current::shown(id.clone(), ShownVia::Draw, history));
        Some(id)
    }

    /// Shows the next item without moving the pointer or writing history.
    ///
    /// Peeking again walks on from the previously peeked slot. Peeking past
    /// the end of the deck rebuilds it, which resets the pointer along with
    /// the order it pointed into.
    pub fn peek(&mut self, history: &History, inputs: &DeckInputs<'_>) -> Option<ItemId> {
        let after = match self.current {
            Some(Current {
                via: ShownVia::Peek { index },
                ..
            }) => Some(index),
            _ => self.pointer,
        };
        let index = self.next_slot(after, history, inputs)?;
        let id = self.deck[index].clone();

        self.current = Some(Current::shown(id.clone(), ShownVia::Peek { index }, history));
        Some(id)
    }

    /// Shows an arbitrary item outside deck order.
    pub fn pick(&mut self, id: ItemId, history: &History) {
        self.current = Some(Current::shown(id, ShownVia::Library, history));
    }

    /// Marks the current item as done or skipped, then clears it.
    ///
    /// A pending `drawn` entry is finalized in place; otherwise a new entry
    /// is appended. Returns the finished item, or `None` when nothing was on
    /// show.
    pub fn finish(
        &mut self,
        outcome: Outcome,
        history: &mut History,
        inputs: &DeckInputs<'_>,
    ) -> Option<ItemId> {
        let current = self.current.take()?;

        if current.pending {
            history.finalize(&current.id, outcome, inputs.now);
        } else {
            history.append(current.id.clone(), outcome.into(), inputs.now);
        }

        match current.via {
            ShownVia::Peek { index } if !current.has_entry => self.pointer = Some(index),
            ShownVia::Library if !current.has_entry => self.rebuild(history, inputs),
            _ => {}
        }

        Some(current.id)
    }

    /// Drops the current item without touching the history.
    pub fn clear(&mut self) -> Option<ItemId> {
        self.current.take().map(|current| current.id)
    }

    /// Removes the most recent history entry.
    ///
    /// If it belonged to an item shown by a committing draw, the pointer
    /// steps back so the next draw offers that slot again. An undone entry
    /// for any other item leaves the pointer where it is.
    pub fn undo(&mut self, history: &mut History) -> Option<HistoryEntry> {
        let entry = history.remove_last()?;

        let Some(current) = self.current.take() else {
            return Some(entry);
        };

        if current.id != entry.id {
            self.current = Some(current);
        } else if current.via == ShownVia::Draw {
            self.pointer = self.pointer.and_then(|pointer| pointer.checked_sub(1));
        } else {
            self.current = Some(Current::shown(current.id, current.via, history));
        }

        Some(entry)
    }

    fn next_slot(
        &mut self,
        after: Option<usize>,
        history: &History,
        inputs: &DeckInputs<'_>,
    ) -> Option<usize> {
        if self.deck.is_empty() {
            self.rebuild(history, inputs);
        }

        let mut next = after.map_or(0, |index| index + 1);
        if next >= self.deck.len() {
            self.rebuild(history, inputs);
            next = 0;
        }

        if self.deck.is_empty() {
            tracing::debug!("No candidates match the active filters");
            None
        } else {
            Some(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::TimeDelta;
    use test_case::test_case;

    use super::*;

    fn ids(raw: &[&str]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    fn inputs(candidates: &[ItemId], days: u32, count: usize) -> DeckInputs<'_> {
        DeckInputs {
            candidates,
            policy: AvoidPolicy::new(days, count),
            now: Utc::now(),
        }
    }

    #[test]
    fn exhausted_deck_rebuilds_and_offers_the_only_candidate_again() {
        let candidates = ids(&["A"]);
        let inputs = inputs(&candidates, 7, 10);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(1);

        assert_eq!(scheduler.draw(&mut history, &inputs).unwrap().as_str(), "A");
        assert_eq!(scheduler.draw(&mut history, &inputs).unwrap().as_str(), "A");
        assert_eq!(history.len(), 2);
    }

    #[test_case(0; "seed zero")]
    #[test_case(3; "seed three")]
    #[test_case(29; "seed twenty-nine")]
    fn exhausted_deck_rebuilds_against_current_history(seed: u64) {
        let candidates = ids(&["A", "B"]);
        let inputs = inputs(&candidates, 0, 1);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(seed);

        let first = scheduler.draw(&mut history, &inputs).unwrap();
        let second = scheduler.draw(&mut history, &inputs).unwrap();
        assert_ne!(first, second);

        // Only the second draw is recent now, so the rebuilt deck leads with
        // the other candidate.
        let third = scheduler.draw(&mut history, &inputs).unwrap();
        assert_ne!(second, third);
        assert_eq!(scheduler.pointer(), Some(0));
    }

    #[test]
    fn peek_past_the_end_rebuilds_and_resets_pointer() {
        let candidates = ids(&["A", "B"]);
        let inputs = inputs(&candidates, 0, 0);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(6);
        scheduler.draw(&mut history, &inputs);
        scheduler.draw(&mut history, &inputs);
        assert_eq!(scheduler.pointer(), Some(1));

        assert!(scheduler.peek(&history, &inputs).is_some());

        assert_eq!(scheduler.pointer(), None);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn recently_done_item_goes_last() {
        let candidates = ids(&["A", "B"]);
        let inputs = inputs(&candidates, 0, 1);
        let mut history = History::new();
        history.append(ItemId::new("A"), Action::Done, inputs.now - TimeDelta::hours(1));

        for seed in 0..20 {
            let mut scheduler = Scheduler::seeded(seed);
            scheduler.rebuild(&history, &inputs);
            assert_eq!(scheduler.deck(), ids(&["B", "A"]));

            let mut history = history.clone();
            assert_eq!(scheduler.draw(&mut history, &inputs).unwrap().as_str(), "B");
        }
    }

    #[test_case(0; "seed zero")]
    #[test_case(17; "seed seventeen")]
    #[test_case(9001; "large seed")]
    fn rebuild_partitions_all_candidates(seed: u64) {
        let candidates: Vec<_> = (0..50).map(|i| ItemId::new(format!("item-{i}"))).collect();
        let inputs = inputs(&candidates, 0, 10);
        let mut history = History::new();
        for id in candidates.iter().step_by(3) {
            history.append(id.clone(), Action::Done, inputs.now);
        }
        let avoid = inputs.policy.avoid_set(&history, inputs.now);

        let mut scheduler = Scheduler::seeded(seed);
        scheduler.rebuild(&history, &inputs);

        let deck: HashSet<_> = scheduler.deck().iter().collect();
        let expected: HashSet<_> = candidates.iter().collect();
        assert_eq!(deck, expected);
        assert_eq!(scheduler.deck().len(), candidates.len());

        let first_recent = scheduler
            .deck()
            .iter()
            .position(|id| avoid.contains(id))
            .unwrap();
        assert_eq!(first_recent, candidates.len() - avoid.len());
        assert!(scheduler.deck()[first_recent..]
            .iter()
            .all(|id| avoid.contains(id)));
        assert_eq!(scheduler.pointer(), None);
    }

    #[test]
    fn no_candidates_leaves_history_untouched() {
        let inputs = inputs(&[], 7, 10);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(3);

        assert_eq!(scheduler.draw(&mut history, &inputs), None);
        assert_eq!(scheduler.peek(&history, &inputs), None);
        assert!(history.is_empty());
        assert_eq!(scheduler.pointer(), None);
        assert!(scheduler.current().is_none());
    }

    #[test]
    fn draw_then_done_finalizes_in_place() {
        let candidates = ids(&["A", "B"]);
        let inputs = inputs(&candidates, 0, 0);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(5);

        let drawn = scheduler.draw(&mut history, &inputs).unwrap();
        let finished = scheduler.finish(Outcome::Done, &mut history, &inputs);

        assert_eq!(finished, Some(drawn));
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().action, Action::Done);
        assert!(scheduler.current().is_none());
        assert_eq!(scheduler.pointer(), Some(0));
    }

    #[test]
    fn finish_without_current_does_nothing() {
        let inputs = inputs(&[], 0, 0);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(5);

        assert_eq!(scheduler.finish(Outcome::Skipped, &mut history, &inputs), None);
        assert!(history.is_empty());
    }

    #[test]
    fn peeks_walk_forward_without_writing() {
        let candidates = ids(&["A", "B", "C"]);
        let inputs = inputs(&candidates, 0, 0);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(11);
        scheduler.rebuild(&history, &inputs);
        let deck = scheduler.deck().to_vec();

        assert_eq!(scheduler.peek(&history, &inputs), Some(deck[0].clone()));
        assert_eq!(scheduler.peek(&history, &inputs), Some(deck[1].clone()));
        assert_eq!(scheduler.pointer(), None);
        assert!(history.is_empty());

        // Finishing the peek consumes its slot, so the next draw follows it.
        scheduler.finish(Outcome::Skipped, &mut history, &inputs);
        assert_eq!(scheduler.pointer(), Some(1));
        assert_eq!(history.len(), 1);
        assert_eq!(
            scheduler.draw(&mut history, &inputs),
            Some(deck[2].clone())
        );
    }

    #[test]
    fn pick_of_pending_item_finalizes_rather_than_appends() {
        let candidates = ids(&["A", "B"]);
        let inputs = inputs(&candidates, 0, 0);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(2);

        let drawn = scheduler.draw(&mut history, &inputs).unwrap();
        scheduler.clear();
        scheduler.pick(drawn.clone(), &history);

        let current = scheduler.current().unwrap();
        assert!(current.has_entry());
        assert!(current.is_pending());

        scheduler.finish(Outcome::Done, &mut history, &inputs);
        assert_eq!(history.len(), 1);
        assert_eq!(scheduler.pointer(), Some(0));
    }

    #[test]
    fn library_pick_without_entry_rebuilds() {
        let candidates = ids(&["A", "B", "C"]);
        let inputs = inputs(&candidates, 0, 0);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(8);
        let drawn = scheduler.draw(&mut history, &inputs).unwrap();
        scheduler.finish(Outcome::Done, &mut history, &inputs);
        let other = candidates.iter().find(|id| **id != drawn).unwrap().clone();

        scheduler.pick(other.clone(), &history);
        assert!(!scheduler.current().unwrap().has_entry());
        scheduler.finish(Outcome::Done, &mut history, &inputs);

        assert_eq!(scheduler.pointer(), None);
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().id, other);
    }

    #[test]
    fn undo_of_current_draw_reoffers_the_slot() {
        let candidates = ids(&["A", "B", "C"]);
        let inputs = inputs(&candidates, 0, 0);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(13);

        let first = scheduler.draw(&mut history, &inputs).unwrap();
        let undone = scheduler.undo(&mut history).unwrap();

        assert_eq!(undone.id, first);
        assert!(history.is_empty());
        assert_eq!(scheduler.pointer(), None);
        assert!(scheduler.current().is_none());
        assert_eq!(scheduler.draw(&mut history, &inputs), Some(first));
    }

    #[test]
    fn undo_of_other_entry_keeps_pointer_and_current() {
        let candidates = ids(&["A", "B", "C"]);
        let inputs = inputs(&candidates, 0, 0);
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(21);
        scheduler.draw(&mut history, &inputs);
        scheduler.draw(&mut history, &inputs);
        history.append(ItemId::new("elsewhere"), Action::Done, inputs.now);

        let undone = scheduler.undo(&mut history).unwrap();

        assert_eq!(undone.id.as_str(), "elsewhere");
        assert_eq!(scheduler.pointer(), Some(1));
        assert!(scheduler.current().is_some());
    }

    #[test]
    fn undo_on_empty_history_is_noop() {
        let mut history = History::new();
        let mut scheduler = Scheduler::seeded(0);

        assert_eq!(scheduler.undo(&mut history), None);
        assert_eq!(scheduler.pointer(), None);
    }

    #[test]
    fn undo_of_finalized_pick_makes_it_pending_again() {
        let candidates = ids(&["A"]);
        let inputs = inputs(&candidates, 0, 0);
        let mut history = History::new();
        history.append(ItemId::new("A"), Action::Drawn, inputs.now);
        let mut scheduler = Scheduler::seeded(4);

        scheduler.pick(ItemId::new("A"), &history);
        history.append(ItemId::new("A"), Action::Skipped, inputs.now);
        scheduler.pick(ItemId::new("A"), &history);
        assert!(!scheduler.current().unwrap().is_pending());

        scheduler.undo(&mut history);

        let current = scheduler.current().unwrap();
        assert_eq!(current.via, ShownVia::Library);
        assert!(current.is_pending());
    }
}
