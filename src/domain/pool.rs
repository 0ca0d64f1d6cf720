use rand::{Rng, seq::SliceRandom};

/// Draws from a fixed list without replacement, refilling once exhausted.
///
/// Every element is returned exactly once per cycle, in a fresh random order
/// each cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleBag<T> {
    items: Vec<T>,
    queue: Vec<T>,
}

impl<T: Clone> ShuffleBag<T> {
    /// Creates a bag over the given elements. The first draw shuffles.
    #[must_use]
    pub const fn new(items: Vec<T>) -> Self {
        Self {
            items,
            queue: Vec::new(),
        }
    }

    /// Number of elements in a full cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the bag has nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of draws left before the next refill.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Takes the next element, refilling with a reshuffled copy when the
    /// current cycle is used up. Returns `None` only for an empty bag.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        if self.queue.is_empty() {
            self.queue.clone_from(&self.items);
            self.queue.shuffle(rng);
        }
        self.queue.pop()
    }
}
