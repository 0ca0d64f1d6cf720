pub mod catalog;
pub mod csv;
mod fetch;
mod prompts;
/// Saving and restoring history, settings and the chosen data source.
pub mod state;

pub use catalog::{Catalog, CatalogError, Format};
pub use fetch::{Fetch, FetchError, SourceFetcher, is_remote};
pub use prompts::{PromptError, PromptPools};
pub use state::{
    DataMode, MemoryStore, PersistedState, Settings, SourceLabel, StateFile, StateStore,
    UploadedData,
};
