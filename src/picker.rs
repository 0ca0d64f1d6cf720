//! A picking session.
//!
//! The [`Picker`] ties the loaded catalog, the persisted state and the deck
//! scheduler together. Every operation that changes history or settings
//! writes the state back before returning.

use std::collections::HashSet;

use chrono::Utc;

use crate::{
    domain::{
        Config, DeckInputs, Filters, History, HistoryEntry, Item, ItemId, Outcome, PoolConfig,
        Scheduler,
    },
    storage::{
        Catalog, CatalogError, DataMode, Fetch, Format, PersistedState, Settings, SourceLabel,
        StateStore, UploadedData,
    },
};

/// Shown for history entries whose idea is no longer in the catalog.
pub const UNKNOWN_IDEA: &str = "(unknown idea)";

/// Sizes reported in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    /// Ideas passing the active filters.
    pub visible: usize,
    /// Ideas in the catalog.
    pub total: usize,
    /// History entries.
    pub history: usize,
}

/// The result of marking an idea as done or skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    /// The idea that was finished.
    pub finished: ItemId,
    /// The idea drawn straight afterwards, when configured to do so.
    pub next: Option<ItemId>,
}

/// An idea picking session over a state store.
#[derive(Debug)]
pub struct Picker<S> {
    store: S,
    config: Config,
    state: PersistedState,
    catalog: Catalog,
    category: Option<String>,
    need: Option<String>,
    scheduler: Scheduler,
}

impl<S: StateStore> Picker<S> {
    /// Opens a session, restoring any saved state from `store`.
    ///
    /// The catalog starts empty; call [`Picker::reload`] to load it.
    pub fn open(store: S, config: Config) -> Self {
        Self::with_scheduler(store, config, Scheduler::new())
    }

    /// Opens a session with a specific scheduler, e.g. a seeded one.
    pub fn with_scheduler(store: S, config: Config, scheduler: Scheduler) -> Self {
        let state = PersistedState::load(&store, &config, Utc::now());
        Self {
            store,
            config,
            state,
            catalog: Catalog::default(),
            category: None,
            need: None,
            scheduler,
        }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The persisted state.
    pub const fn state(&self) -> &PersistedState {
        &self.state
    }

    /// The scheduling settings.
    pub const fn settings(&self) -> Settings {
        self.state.settings
    }

    /// The pick history.
    pub const fn history(&self) -> &History {
        &self.state.history
    }

    /// The loaded catalog.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The deck scheduler.
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The idea on show, if any.
    pub fn current(&self) -> Option<&Item> {
        self.scheduler
            .current()
            .and_then(|current| self.catalog.get(current.id.as_str()))
    }

    /// The title of an idea, or a placeholder if it is not in the catalog.
    pub fn title_of(&self, id: &ItemId) -> &str {
        self.catalog
            .get(id.as_str())
            .map_or(UNKNOWN_IDEA, |item| item.title.as_str())
    }

    /// The prompt pool attached to an idea, if any.
    pub fn pool_for(&self, item: &Item) -> Option<&PoolConfig> {
        self.config.pool_for(item)
    }

    /// Replaces the catalog and rebuilds the deck.
    pub fn apply_catalog(&mut self, catalog: Catalog, source: SourceLabel) {
        tracing::info!(
            "Using {} ideas from {}",
            catalog.len(),
            source.label
        );
        self.catalog = catalog;
        self.state.data_mode = source.kind;
        self.state.last_source = Some(source);
        self.persist();
        self.rebuild();
    }

    /// Loads the catalog from the saved data source.
    ///
    /// Returns the number of ideas loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched or parsed. The
    /// session is left untouched.
    pub fn reload(&mut self, fetcher: &impl Fetch) -> Result<usize, CatalogError> {
        self.load_from(self.state.effective_mode(), fetcher)
    }

    /// Switches between the data URL and the uploaded file, then reloads.
    ///
    /// Choosing the upload when none is saved falls back to the data URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched or parsed. The
    /// session is left untouched.
    pub fn use_mode(&mut self, mode: DataMode, fetcher: &impl Fetch) -> Result<usize, CatalogError> {
        self.load_from(mode, fetcher)
    }

    fn load_from(&mut self, mode: DataMode, fetcher: &impl Fetch) -> Result<usize, CatalogError> {
        let (catalog, source) = match (mode, &self.state.uploaded_data) {
            (DataMode::Upload, Some(upload)) => {
                let catalog = Catalog::parse(&upload.text, &upload.name, Some(upload.format))?;
                (catalog, SourceLabel {
                    kind: DataMode::Upload,
                    label: upload_label(&upload.name),
                })
            }
            _ => {
                let url = self.state.data_url.clone();
                let catalog = Catalog::fetch(fetcher, &url)?;
                (catalog, SourceLabel {
                    kind: DataMode::Url,
                    label: url,
                })
            }
        };

        let count = catalog.len();
        self.apply_catalog(catalog, source);
        Ok(count)
    }

    /// Loads a catalog from file content and keeps it for later sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be parsed. The session is left
    /// untouched.
    pub fn upload(&mut self, name: &str, text: String) -> Result<usize, CatalogError> {
        let format = Format::detect(name, &text);
        let catalog = Catalog::parse(&text, name, Some(format))?;
        let count = catalog.len();

        self.state.uploaded_data = Some(UploadedData {
            name: name.to_string(),
            text,
            format,
        });
        self.apply_catalog(catalog, SourceLabel {
            kind: DataMode::Upload,
            label: upload_label(name),
        });
        Ok(count)
    }

    /// Sets the ephemeral category and need filters, then rebuilds the deck.
    pub fn set_filters(&mut self, category: Option<String>, need: Option<String>) {
        self.category = category;
        self.need = need;
        self.rebuild();
    }

    /// The filters in effect.
    pub fn filters(&self) -> Filters {
        Filters::new(self.state.settings.max_duration)
            .with_category(self.category.clone())
            .with_need(self.need.clone())
    }

    /// Saves new scheduling settings, then rebuilds the deck.
    pub fn set_settings(&mut self, settings: Settings) {
        self.state.settings = settings;
        self.persist();
        self.rebuild();
    }

    /// Saves a new data URL. Blank means the configured default.
    ///
    /// The catalog is not reloaded.
    pub fn set_data_url(&mut self, url: &str) {
        let url = url.trim();
        self.state.data_url = if url.is_empty() {
            self.config.data_url().to_string()
        } else {
            url.to_string()
        };
        self.persist();
    }

    /// Ids of the ideas passing the filters, in catalog order.
    pub fn candidates(&self) -> Vec<ItemId> {
        let filters = self.filters();
        self.catalog
            .filtered(&filters)
            .map(|item| item.id.clone())
            .collect()
    }

    /// The ids currently avoided as recent.
    pub fn avoid_set(&self) -> HashSet<ItemId> {
        self.state
            .settings
            .policy()
            .avoid_set(&self.state.history, Utc::now())
    }

    /// Whether an idea counts as recent.
    pub fn is_recent(&self, id: &ItemId) -> bool {
        self.avoid_set().contains(id)
    }

    /// Catalog, visible and history sizes.
    pub fn counts(&self) -> Counts {
        Counts {
            visible: self.candidates().len(),
            total: self.catalog.len(),
            history: self.state.history.len(),
        }
    }

    /// Draws the next idea and records it.
    ///
    /// Returns `None` when nothing passes the filters.
    pub fn draw(&mut self) -> Option<&Item> {
        let candidates = self.candidates();
        let inputs = self.inputs(&candidates);
        let id = self.scheduler.draw(&mut self.state.history, &inputs)?;
        self.persist();
        self.catalog.get(id.as_str())
    }

    /// Shows the next idea without recording it.
    pub fn peek(&mut self) -> Option<&Item> {
        let candidates = self.candidates();
        let inputs = self.inputs(&candidates);
        let id = self.scheduler.peek(&self.state.history, &inputs)?;
        self.catalog.get(id.as_str())
    }

    /// Shows a specific idea from the catalog.
    ///
    /// Returns `None` if the catalog has no idea with that id, or if the
    /// active filters exclude it.
    pub fn pick(&mut self, id: &str) -> Option<&Item> {
        let filters = self.filters();
        let item = self.catalog.get(id).filter(|item| filters.matches(item))?;
        self.scheduler.pick(item.id.clone(), &self.state.history);
        Some(item)
    }

    /// Puts the idea from a pending `drawn` entry back on show.
    ///
    /// Lets a later session finish an idea drawn in an earlier one, even if
    /// the filters have changed since.
    pub fn resume(&mut self) -> Option<&Item> {
        let last = self.state.history.last().filter(|entry| entry.is_pending())?;
        let item = self.catalog.get(last.id.as_str())?;
        self.scheduler.pick(item.id.clone(), &self.state.history);
        Some(item)
    }

    /// Marks the idea on show as done.
    ///
    /// Draws the next idea straight away if the configuration asks for it.
    pub fn done(&mut self) -> Option<Finished> {
        let finished = self.finish(Outcome::Done)?;
        let next = if self.config.draw_after_done {
            self.draw().map(|item| item.id.clone())
        } else {
            None
        };
        Some(Finished { finished, next })
    }

    /// Marks the idea on show as skipped.
    pub fn skip(&mut self) -> Option<Finished> {
        let finished = self.finish(Outcome::Skipped)?;
        Some(Finished {
            finished,
            next: None,
        })
    }

    fn finish(&mut self, outcome: Outcome) -> Option<ItemId> {
        let candidates = self.candidates();
        let inputs = self.inputs(&candidates);
        let id = self
            .scheduler
            .finish(outcome, &mut self.state.history, &inputs)?;
        self.persist();
        Some(id)
    }

    /// Takes the idea off show without recording anything.
    pub fn clear(&mut self) -> Option<ItemId> {
        self.scheduler.clear()
    }

    /// Removes the most recent history entry.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.scheduler.undo(&mut self.state.history)?;
        self.persist();
        Some(entry)
    }

    /// Forgets the whole history and reshuffles.
    pub fn reset_history(&mut self) {
        tracing::info!("Clearing {} history entries", self.state.history.len());
        self.state.history.reset();
        self.scheduler.clear();
        self.persist();
        self.rebuild();
    }

    fn inputs<'a>(&self, candidates: &'a [ItemId]) -> DeckInputs<'a> {
        DeckInputs {
            candidates,
            policy: self.state.settings.policy(),
            now: Utc::now(),
        }
    }

    fn rebuild(&mut self) {
        let candidates = self.candidates();
        let inputs = self.inputs(&candidates);
        self.scheduler.rebuild(&self.state.history, &inputs);
    }

    fn persist(&mut self) {
        if let Err(e) = self.state.save(&mut self.store) {
            tracing::warn!("Failed to save state: {e}");
        }
    }
}

fn upload_label(name: &str) -> String {
    if name.is_empty() {
        "Uploaded file".to_string()
    } else {
        name.to_string()
    }
}
