use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    domain::ShuffleBag,
    storage::{Fetch, FetchError, csv},
};

type Slot = Arc<Mutex<Option<Arc<[String]>>>>;

/// Supplementary prompt lists, fetched lazily and drawn from shuffle bags.
///
/// Each source is fetched at most once. Concurrent loads of the same source
/// wait on a single fetch; a failed fetch is not remembered, so the next load
/// tries again.
#[derive(Debug)]
pub struct PromptPools<F> {
    fetcher: F,
    slots: Mutex<HashMap<String, Slot>>,
    bags: Mutex<Bags>,
}

#[derive(Debug)]
struct Bags {
    bags: HashMap<String, ShuffleBag<String>>,
    rng: StdRng,
}

impl<F: Fetch> PromptPools<F> {
    /// Creates an empty cache drawing through `fetcher`.
    pub fn new(fetcher: F) -> Self {
        Self::with_rng(fetcher, StdRng::from_entropy())
    }

    /// Creates an empty cache with a fixed shuffle seed.
    pub fn seeded(fetcher: F, seed: u64) -> Self {
        Self::with_rng(fetcher, StdRng::seed_from_u64(seed))
    }

    fn with_rng(fetcher: F, rng: StdRng) -> Self {
        Self {
            fetcher,
            slots: Mutex::default(),
            bags: Mutex::new(Bags {
                bags: HashMap::new(),
                rng,
            }),
        }
    }

    /// Loads the prompts at `source`, fetching them on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the source has not been loaded before and cannot
    /// be fetched.
    pub fn load(&self, source: &str) -> Result<Arc<[String]>, PromptError> {
        let slot = lock(&self.slots).entry(source.to_string()).or_default().clone();

        let mut prompts = lock(&*slot);
        if let Some(loaded) = prompts.as_ref() {
            return Ok(Arc::clone(loaded));
        }

        let text = self.fetcher.fetch_text(source)?;
        let loaded: Arc<[String]> = csv::prompt_column(&text).into();
        tracing::info!("Loaded {} prompts from {source}", loaded.len());
        *prompts = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Draws the next prompt from `source`.
    ///
    /// Every prompt is drawn once before any repeats. Returns `None` when the
    /// source holds no prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompts cannot be loaded.
    pub fn draw(&self, source: &str) -> Result<Option<String>, PromptError> {
        let prompts = self.load(source)?;

        let mut guard = lock(&self.bags);
        let Bags { bags, rng } = &mut *guard;
        let bag = bags
            .entry(source.to_string())
            .or_insert_with(|| ShuffleBag::new(prompts.to_vec()));
        Ok(bag.draw(rng))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Prompts could not be loaded.
#[derive(Debug, thiserror::Error)]
#[error("could not load prompts: {0}")]
pub struct PromptError(#[from] FetchError);
