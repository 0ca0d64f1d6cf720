//! Idea picker with "no recent repeats" memory.
//!
//! A catalog of short activities is drawn from one idea at a time. A local
//! history of what was shown, done or skipped biases every new deck towards
//! ideas that have not come up recently.

pub mod domain;
pub use domain::{
    Action, AvoidPolicy, Config, Filters, History, HistoryEntry, Item, ItemId, Need, Outcome,
    PoolConfig, Scheduler, ShuffleBag,
};

/// Catalog loading, prompt lists and the persisted state blob.
pub mod storage;
pub use storage::{
    Catalog, CatalogError, DataMode, Fetch, FetchError, MemoryStore, PersistedState, PromptError,
    PromptPools, Settings, SourceFetcher, StateFile, StateStore,
};

mod picker;
pub use picker::{Counts, Finished, Picker, UNKNOWN_IDEA};
