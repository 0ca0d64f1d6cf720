use std::{borrow::Borrow, fmt};

use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::Need;

/// Shortest duration an item can have, in minutes.
pub const MIN_DURATION: u32 = 1;
/// Longest duration an item can have, in minutes.
pub const MAX_DURATION: u32 = 240;
/// Duration used when the source does not give one.
pub const DEFAULT_DURATION: u32 = 15;

/// Stable identifier of a catalog item.
///
/// Identifiers are opaque tokens. History entries keep them even after the
/// catalog stops containing a matching item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wraps an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An idea in the catalog.
///
/// Items are immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Identifier, either supplied by the source or derived from the content.
    pub id: ItemId,
    /// Short title shown on the card.
    pub title: String,
    /// Longer free-text description. May be empty.
    pub description: String,
    /// Optional category used for filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Canonical needs the idea speaks to.
    pub needs: Vec<Need>,
    /// How long the idea takes, clamped to [`MIN_DURATION`, `MAX_DURATION`].
    pub duration_minutes: u32,
    /// Optional energy tag (e.g. "low", "high").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    /// Optional external resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Label for [`Item::link`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_label: Option<String>,
}

impl Item {
    /// Whether the item's title equals `title`, ignoring case.
    #[must_use]
    pub fn has_title(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.trim().to_lowercase()
    }
}

/// The content an identifier is derived from when the source omits one.
///
/// Reloading identical source data must give identical identifiers, so that
/// history survives a reload.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdentityRef<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) category: &'a str,
    pub(crate) needs: &'a [Need],
    pub(crate) duration: u32,
    pub(crate) energy: &'a str,
}

impl IdentityRef<'_> {
    /// Derive an identifier from the content.
    ///
    /// The identifier is `i` followed by the first 12 hex digits of a SHA256
    /// hash over the Borsh-serialized fields.
    ///
    /// # Panics
    ///
    /// Panics if borsh serialization fails (which should never happen for this
    /// data structure).
    #[must_use]
    pub(crate) fn derive_id(&self) -> ItemId {
        #[derive(BorshSerialize)]
        struct IdentityData<'a> {
            title: &'a str,
            description: &'a str,
            category: &'a str,
            needs: Vec<&'a str>,
            duration: u32,
            energy: &'a str,
        }

        let data = IdentityData {
            title: self.title,
            description: self.description,
            category: self.category,
            needs: self.needs.iter().map(Need::as_str).collect(),
            duration: self.duration,
            energy: self.energy,
        };

        let encoded = borsh::to_vec(&data).expect("this should never fail");
        let hash = format!("{:x}", Sha256::digest(encoded));

        ItemId(format!("i{}", &hash[..12]))
    }
}
