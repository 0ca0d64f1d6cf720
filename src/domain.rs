//! Domain models for the idea picker.
//!
//! This module contains the catalog item type, the pick history, the recency
//! policy and the deck scheduler built on top of them.

/// Catalog items and their identifiers.
pub mod item;
pub use item::{Item, ItemId};

/// The closed vocabulary of needs an idea can be tagged with.
pub mod need;
pub use need::Need;

mod config;
pub use config::{Config, PoolConfig};

/// The capacity-bounded log of pick events.
pub mod history;
pub use history::{Action, History, HistoryEntry, Outcome};

/// Which items count as "recently used".
pub mod recency;
pub use recency::AvoidPolicy;

mod filter;
pub use filter::Filters;

/// Deck ordering and the current-item state machine.
pub mod deck;
pub use deck::{Current, DeckInputs, Scheduler, ShownVia};

/// Draw-without-replacement bags for supplementary prompts.
pub mod pool;
pub use pool::ShuffleBag;
