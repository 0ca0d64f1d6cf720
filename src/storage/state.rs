//! The persisted state blob.
//!
//! History, settings and the chosen data source are saved together as one
//! JSON document. Older documents are upgraded in memory when loaded; they
//! never fail to load.

use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{Action, AvoidPolicy, Config, History, HistoryEntry, ItemId},
    storage::Format,
};

/// Name the state is stored under.
pub const STORAGE_KEY: &str = "15funs.v1.state";

/// The schema version written by this crate.
pub const SETTINGS_VERSION: u32 = 2;

/// User-adjustable scheduling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Size of the "avoid repeats" time window, in days.
    pub avoid_days: u32,
    /// Number of most recent distinct picks to avoid.
    pub avoid_count: usize,
    /// Longest duration shown, in minutes.
    pub max_duration: u32,
}

impl Settings {
    /// The defaults from the configuration file.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            avoid_days: config.avoid_days(),
            avoid_count: config.avoid_count(),
            max_duration: config.max_duration(),
        }
    }

    /// The recency policy these settings describe.
    #[must_use]
    pub const fn policy(&self) -> AvoidPolicy {
        AvoidPolicy::new(self.avoid_days, self.avoid_count)
    }
}

/// Where the catalog is loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// The configured data URL or path.
    #[default]
    Url,
    /// A file the user uploaded earlier.
    Upload,
}

/// A catalog file kept verbatim so it can be reloaded later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedData {
    /// The original file name.
    pub name: String,
    /// The file content.
    pub text: String,
    /// The format detected at upload time.
    pub format: Format,
}

/// Describes the last catalog that loaded successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLabel {
    /// Whether it came from a URL or an upload.
    #[serde(rename = "type")]
    pub kind: DataMode,
    /// The URL or file name.
    pub label: String,
}

/// Everything saved between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// The pick history.
    pub history: History,
    /// Schema version, always [`SETTINGS_VERSION`] once loaded.
    pub settings_version: u32,
    /// Where to fetch the catalog from in [`DataMode::Url`].
    pub data_url: String,
    /// Scheduling settings.
    #[serde(flatten)]
    pub settings: Settings,
    /// The last uploaded catalog, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_data: Option<UploadedData>,
    /// Which source to load on start.
    pub data_mode: DataMode,
    /// The last catalog that loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_source: Option<SourceLabel>,
}

impl PersistedState {
    /// A fresh state using the configured defaults.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            history: History::new(),
            settings_version: SETTINGS_VERSION,
            data_url: config.data_url().to_string(),
            settings: Settings::from_config(config),
            uploaded_data: None,
            data_mode: DataMode::Url,
            last_source: None,
        }
    }

    /// Reads the state from `store`, upgrading older documents.
    ///
    /// A missing, unreadable or unparseable document gives a fresh state.
    pub fn load(store: &impl StateStore, config: &Config, now: DateTime<Utc>) -> Self {
        let text = match store.read() {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!("No saved state found, starting fresh");
                return Self::new(config);
            }
            Err(e) => {
                tracing::warn!("Failed to read saved state, starting fresh: {e}");
                return Self::new(config);
            }
        };

        match serde_json::from_str::<RawState>(&text) {
            Ok(raw) => raw.migrate(config, now),
            Err(e) => {
                tracing::warn!("Saved state is not valid, starting fresh: {e}");
                Self::new(config)
            }
        }
    }

    /// Writes the state to `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn save(&self, store: &mut impl StateStore) -> io::Result<()> {
        let text = serde_json::to_string(self)?;
        store.write(&text)
    }

    /// The data source to load on start, accounting for a missing upload.
    #[must_use]
    pub const fn effective_mode(&self) -> DataMode {
        match (self.data_mode, &self.uploaded_data) {
            (DataMode::Upload, Some(_)) => DataMode::Upload,
            _ => DataMode::Url,
        }
    }
}

/// A document of any schema version, read as loosely as possible.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawState {
    history: Value,
    settings_version: Value,
    data_url: Value,
    avoid_days: Value,
    avoid_count: Value,
    max_duration: Value,
    uploaded_data: Value,
    data_mode: Value,
    last_source: Value,
}

impl RawState {
    fn migrate(self, config: &Config, now: DateTime<Utc>) -> PersistedState {
        let version = self.settings_version.as_u64();
        if version != Some(u64::from(SETTINGS_VERSION)) {
            tracing::info!(
                from = ?version,
                to = SETTINGS_VERSION,
                "Upgrading saved state"
            );
        }

        let history = match self.history {
            Value::Array(entries) => History::from_entries(
                entries
                    .into_iter()
                    .filter_map(|entry| migrate_entry(entry, now)),
            ),
            _ => History::new(),
        };

        let data_url = self
            .data_url
            .as_str()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(config.data_url())
            .to_string();

        let settings = Settings {
            avoid_days: number(&self.avoid_days).unwrap_or(config.avoid_days()),
            avoid_count: number(&self.avoid_count).unwrap_or(config.avoid_count()),
            max_duration: number(&self.max_duration).unwrap_or(config.max_duration()),
        };

        let uploaded_data = serde_json::from_value::<UploadedData>(self.uploaded_data).ok();
        let data_mode = match (self.data_mode.as_str(), &uploaded_data) {
            (Some("upload"), Some(_)) => DataMode::Upload,
            _ => DataMode::Url,
        };
        let last_source = serde_json::from_value(self.last_source).ok();

        PersistedState {
            history,
            settings_version: SETTINGS_VERSION,
            data_url,
            settings,
            uploaded_data,
            data_mode,
            last_source,
        }
    }
}

/// Upgrades one history entry. Entries without a usable id are dropped.
fn migrate_entry(raw: Value, now: DateTime<Utc>) -> Option<HistoryEntry> {
    let Value::Object(mut entry) = raw else {
        return None;
    };

    let id = match entry.remove("id")? {
        Value::String(id) if !id.is_empty() => ItemId::from(id),
        Value::Number(id) => ItemId::new(id.to_string()),
        _ => return None,
    };
    let at = entry.get("t").and_then(timestamp).unwrap_or(now);
    let action = entry
        .remove("action")
        .and_then(|action| serde_json::from_value::<Action>(action).ok())
        .unwrap_or_default();

    Some(HistoryEntry {
        id,
        at,
        action,
        done_at: entry.get("doneAt").and_then(timestamp),
        skipped_at: entry.get("skippedAt").and_then(timestamp),
    })
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let millis = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))?;
    DateTime::from_timestamp_millis(millis)
}

/// Reads a non-negative whole number stored as a number or a numeric string.
fn number<T: TryFrom<u64>>(value: &Value) -> Option<T> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    T::try_from(n).ok()
}

/// Somewhere the state document can be kept.
pub trait StateStore {
    /// Reads the document, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    fn read(&self) -> io::Result<Option<String>>;

    /// Replaces the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn write(&mut self, contents: &str) -> io::Result<()>;
}

/// Keeps the state document in a JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Uses the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses the standard file name inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{STORAGE_KEY}.json")))
    }

    /// The per-user data directory for this application, if the platform
    /// has one.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        directories::ProjectDirs::from("", "", "15funs")
            .map(|dirs| Self::in_dir(dirs.data_local_dir()))
    }

    /// The file backing this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for StateFile {
    fn read(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)
    }
}

/// Keeps the state document in memory. Nothing survives the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    contents: Option<String>,
}

impl MemoryStore {
    /// A store holding `contents` as if previously saved.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    /// The last document written.
    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl StateStore for MemoryStore {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        self.contents = Some(contents.to_string());
        Ok(())
    }
}
