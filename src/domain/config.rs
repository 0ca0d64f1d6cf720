use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Item;

/// Configuration for the picker.
///
/// This struct holds the defaults used for a fresh state and the prompt pools
/// attached to particular ideas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Where the catalog is fetched from when no data URL has been saved yet.
    ///
    /// Either an `http(s)://` URL or a path relative to the data root.
    data_url: String,

    /// Default size of the "avoid repeats" time window, in days.
    avoid_days: u32,

    /// Default number of most recent distinct picks to avoid.
    avoid_count: usize,

    /// Default longest duration shown, in minutes.
    max_duration: u32,

    /// Whether marking an idea as done immediately draws the next one.
    pub draw_after_done: bool,

    /// Supplementary prompt lists, each attached to ideas by title.
    pools: Vec<PoolConfig>,
}

/// A supplementary prompt list shown alongside particular ideas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Short name used to refer to the pool.
    pub name: String,

    /// Where the prompt list is fetched from.
    pub source: String,

    /// Heading shown above a prompt.
    pub label: String,

    /// Titles of the ideas this pool belongs to, compared ignoring case.
    #[serde(default)]
    pub titles: Vec<String>,
}

impl PoolConfig {
    fn new(name: &str, source: &str, label: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            label: label.to_string(),
            titles: vec![title.to_string()],
        }
    }

    /// Whether this pool belongs to the given idea.
    #[must_use]
    pub fn applies_to(&self, item: &Item) -> bool {
        self.titles.iter().any(|title| item.has_title(title))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_url: default_data_url(),
            avoid_days: default_avoid_days(),
            avoid_count: default_avoid_count(),
            max_duration: default_max_duration(),
            draw_after_done: false,
            pools: default_pools(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// The default catalog location.
    #[must_use]
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// The default time window, in days.
    #[must_use]
    pub const fn avoid_days(&self) -> u32 {
        self.avoid_days
    }

    /// The default number of distinct recent picks to avoid.
    #[must_use]
    pub const fn avoid_count(&self) -> usize {
        self.avoid_count
    }

    /// The default longest duration, in minutes.
    #[must_use]
    pub const fn max_duration(&self) -> u32 {
        self.max_duration
    }

    /// All configured prompt pools.
    #[must_use]
    pub fn pools(&self) -> &[PoolConfig] {
        &self.pools
    }

    /// Looks up a pool by name, ignoring case.
    #[must_use]
    pub fn pool(&self, name: &str) -> Option<&PoolConfig> {
        self.pools
            .iter()
            .find(|pool| pool.name.eq_ignore_ascii_case(name))
    }

    /// The first pool attached to an idea, if any.
    #[must_use]
    pub fn pool_for(&self, item: &Item) -> Option<&PoolConfig> {
        self.pools.iter().find(|pool| pool.applies_to(item))
    }
}

fn default_data_url() -> String {
    "data/ideas.csv".to_string()
}

const fn default_avoid_days() -> u32 {
    7
}

const fn default_avoid_count() -> usize {
    10
}

const fn default_max_duration() -> u32 {
    15
}

fn default_pools() -> Vec<PoolConfig> {
    vec![
        PoolConfig::new("charades", "data/charades.csv", "Charades prompt", "Charades"),
        PoolConfig::new(
            "conversation",
            "data/question_prompts.csv",
            "Conversation spark",
            "Seven-minute question trade",
        ),
        PoolConfig::new(
            "yesno",
            "data/yes_no_questions.csv",
            "Yes/No prompt",
            "20 questions with a maybe",
        ),
    ]
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_data_url")]
        data_url: String,

        #[serde(default = "default_avoid_days")]
        avoid_days: u32,

        #[serde(default = "default_avoid_count")]
        avoid_count: usize,

        #[serde(default = "default_max_duration")]
        max_duration: u32,

        #[serde(default)]
        draw_after_done: bool,

        #[serde(default = "default_pools")]
        pools: Vec<PoolConfig>,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                data_url,
                avoid_days,
                avoid_count,
                max_duration,
                draw_after_done,
                pools,
            } => Self {
                data_url,
                avoid_days,
                avoid_count,
                max_duration,
                draw_after_done,
                pools,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            data_url: config.data_url,
            avoid_days: config.avoid_days,
            avoid_count: config.avoid_count,
            max_duration: config.max_duration,
            draw_after_done: config.draw_after_done,
            pools: config.pools,
        }
    }
}
