//! Loading and normalizing the idea catalog.
//!
//! Sources are CSV or JSON text with loosely named fields. Every record is
//! normalized into an [`Item`] with a stable identifier, so that history
//! entries keep pointing at the same idea across reloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{
        Filters, Item, ItemId, Need,
        item::{DEFAULT_DURATION, IdentityRef, MAX_DURATION, MIN_DURATION},
    },
    storage::{Fetch, FetchError, csv},
};

/// The text formats a catalog can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Comma separated values with a header row.
    Csv,
    /// An array of objects, or an object holding one under `ideas` or `data`.
    Json,
}

impl Format {
    /// Guesses the format from a file name or URL, then from the content.
    ///
    /// A `.json` or `.csv` suffix wins. Otherwise text starting with `{` or
    /// `[` is JSON and anything else, including empty text, is CSV.
    #[must_use]
    pub fn detect(name_hint: &str, text: &str) -> Self {
        let lowered = name_hint.to_lowercase();
        if lowered.ends_with(".json") {
            return Self::Json;
        }
        if lowered.ends_with(".csv") {
            return Self::Csv;
        }
        match text.trim_start().chars().next() {
            Some('{' | '[') => Self::Json,
            _ => Self::Csv,
        }
    }
}

/// Failures while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The text claimed to be JSON but could not be parsed.
    #[error("invalid JSON data in {name}: {error}")]
    InvalidJson {
        /// The file name or URL the text came from.
        name: String,
        /// The parse failure.
        #[source]
        error: serde_json::Error,
    },

    /// Valid JSON without a list of ideas in it.
    #[error("JSON data must be an array or contain an \"ideas\" array")]
    MissingArray,

    /// The source could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// The loaded set of ideas.
///
/// When two records share an identifier, the later one wins and the earlier
/// one is not visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Builds a catalog from normalized items.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let items: Vec<_> = items.into_iter().collect();

        let mut latest = HashMap::new();
        for (position, item) in items.iter().enumerate() {
            if latest.insert(item.id.clone(), position).is_some() {
                tracing::warn!("Duplicate idea id '{}'; the later record wins", item.id);
            }
        }

        let items: Vec<_> = items
            .into_iter()
            .enumerate()
            .filter(|(position, item)| latest.get(&item.id) == Some(position))
            .map(|(_, item)| item)
            .collect();
        let index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id.clone(), position))
            .collect();

        Self { items, index }
    }

    /// Parses catalog text.
    ///
    /// `name_hint` is the file name or URL the text came from. It is used to
    /// detect the format when none is given, and in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON text is malformed or does not contain a list
    /// of ideas. CSV text always parses.
    pub fn parse(
        text: &str,
        name_hint: &str,
        format: Option<Format>,
    ) -> Result<Self, CatalogError> {
        let format = format.unwrap_or_else(|| Format::detect(name_hint, text));
        let records = match format {
            Format::Csv => csv::records(text),
            Format::Json => json_records(text, name_hint)?,
        };

        let catalog = Self::new(records.iter().map(normalize));
        tracing::info!(
            "Loaded {} ideas from {}",
            catalog.len(),
            if name_hint.is_empty() { "text" } else { name_hint }
        );
        Ok(catalog)
    }

    /// Fetches and parses the catalog at `location`.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be fetched or its content
    /// cannot be parsed.
    pub fn fetch(fetcher: &impl Fetch, location: &str) -> Result<Self, CatalogError> {
        let text = fetcher.fetch_text(location)?;
        Self::parse(&text, location, None)
    }

    /// Looks up an idea by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    /// Number of ideas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no ideas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All ideas, in source order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The ideas passing `filters`, in source order.
    pub fn filtered<'a>(&'a self, filters: &'a Filters) -> impl Iterator<Item = &'a Item> + 'a {
        self.items.iter().filter(|item| filters.matches(item))
    }

    /// Distinct categories, sorted, ignoring case when deduplicating.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self
            .items
            .iter()
            .filter_map(|item| item.category.as_deref())
            .collect();
        categories.sort_by_key(|category| category.to_lowercase());
        categories.dedup_by_key(|category| category.to_lowercase());
        categories
    }

    /// Needs used by at least one idea, in vocabulary order.
    #[must_use]
    pub fn needs(&self) -> Vec<Need> {
        Need::all()
            .filter(|need| self.items.iter().any(|item| item.needs.contains(need)))
            .collect()
    }
}

fn json_records(text: &str, name_hint: &str) -> Result<Vec<Map<String, Value>>, CatalogError> {
    let parsed: Value = serde_json::from_str(text).map_err(|error| CatalogError::InvalidJson {
        name: if name_hint.is_empty() {
            "uploaded data".to_string()
        } else {
            name_hint.to_string()
        },
        error,
    })?;

    let array = match parsed {
        Value::Array(array) => array,
        Value::Object(mut object) => match (object.remove("ideas"), object.remove("data")) {
            (Some(Value::Array(array)), _) | (_, Some(Value::Array(array))) => array,
            _ => return Err(CatalogError::MissingArray),
        },
        _ => return Err(CatalogError::MissingArray),
    };

    Ok(array
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(object) => Some(object),
            _ => None,
        })
        .collect())
}

/// Turns one loosely shaped record into an [`Item`].
fn normalize(record: &Map<String, Value>) -> Item {
    let fields: HashMap<String, &Value> = record
        .iter()
        .map(|(key, value)| (key.trim().to_lowercase(), value))
        .collect();
    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| fields.get(*name).copied().filter(|value| !value.is_null()))
    };
    let text = |names: &[&str]| field(names).map(as_text).unwrap_or_default();

    let title = text(&["title", "idea", "name"]);
    let description = text(&["desc", "description"]);
    let category = text(&["category"]);
    let needs = field(&["needs", "need"]).map(parse_needs).unwrap_or_default();
    let duration = field(&["duration", "minutes"])
        .and_then(leading_int)
        .unwrap_or(i64::from(DEFAULT_DURATION))
        .clamp(i64::from(MIN_DURATION), i64::from(MAX_DURATION));
    let duration = u32::try_from(duration).unwrap_or(DEFAULT_DURATION);
    let energy = text(&["energy"]);
    let link = text(&["link", "url"]);
    let link_label = text(&["link_label", "linklabel"]);

    let id = field(&["id"])
        .map(as_text)
        .filter(|id| !id.is_empty())
        .map_or_else(
            || {
                IdentityRef {
                    title: &title,
                    description: &description,
                    category: &category,
                    needs: &needs,
                    duration,
                    energy: &energy,
                }
                .derive_id()
            },
            ItemId::from,
        );

    Item {
        id,
        title: if title.is_empty() {
            "(untitled)".to_string()
        } else {
            title
        },
        description,
        category: non_empty(category),
        needs,
        duration_minutes: duration,
        energy: non_empty(energy),
        link: non_empty(link),
        link_label: non_empty(link_label),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn parse_needs(value: &Value) -> Vec<Need> {
    let parts: Vec<&str> = match value {
        Value::String(s) => split_needs(s).collect(),
        Value::Array(values) => values
            .iter()
            .filter_map(Value::as_str)
            .flat_map(split_needs)
            .collect(),
        _ => Vec::new(),
    };
    Need::resolve_all(parts)
}

fn split_needs(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(['|', ';', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

/// Reads a whole number from the start of a value, ignoring anything after
/// it, so `"10 min"` reads as 10.
#[allow(clippy::cast_possible_truncation)]
fn leading_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s.strip_prefix('+').unwrap_or(s)),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    #[test_case("ideas.json", "title\n", Format::Json; "json extension wins")]
    #[test_case("IDEAS.CSV", "[]", Format::Csv; "csv extension wins")]
    #[test_case("", "  [{\"title\":\"x\"}]", Format::Json; "leading bracket")]
    #[test_case("upload", "{\"ideas\":[]}", Format::Json; "leading brace")]
    #[test_case("", "title\nWalk", Format::Csv; "plain text")]
    #[test_case("", "", Format::Csv; "empty")]
    fn detects_format(hint: &str, text: &str, expected: Format) {
        assert_eq!(Format::detect(hint, text), expected);
    }

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(object) => object,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn normalizes_aliased_fields() {
        let item = normalize(&record(json!({
            "Idea": "Walk",
            "Description": "Around the block",
            "CATEGORY": "Outdoors",
            "Need": "rest; calm | pizza",
            "Minutes": "10 min",
            "URL": "https://example.com",
            "LinkLabel": "Map",
        })));

        assert_eq!(item.title, "Walk");
        assert_eq!(item.description, "Around the block");
        assert_eq!(item.category.as_deref(), Some("Outdoors"));
        let needs: Vec<_> = item.needs.iter().map(Need::as_str).collect();
        assert_eq!(needs, ["Rest", "Calm"]);
        assert_eq!(item.duration_minutes, 10);
        assert_eq!(item.link.as_deref(), Some("https://example.com"));
        assert_eq!(item.link_label.as_deref(), Some("Map"));
        assert!(item.id.as_str().starts_with('i'));
    }

    #[test_case(json!("0"), 1; "below minimum")]
    #[test_case(json!(999), 240; "above maximum")]
    #[test_case(json!("soon"), 15; "unparseable")]
    #[test_case(json!(12.7), 12; "fractional")]
    #[test_case(Value::Null, 15; "missing")]
    fn clamps_duration(raw: Value, expected: u32) {
        let item = normalize(&record(json!({ "title": "x", "duration": raw })));
        assert_eq!(item.duration_minutes, expected);
    }

    #[test]
    fn missing_title_is_untitled() {
        let item = normalize(&record(json!({ "description": "mystery" })));
        assert_eq!(item.title, "(untitled)");
    }

    #[test]
    fn explicit_id_is_kept() {
        let item = normalize(&record(json!({ "id": 42, "title": "x" })));
        assert_eq!(item.id.as_str(), "42");
    }

    #[test]
    fn derived_ids_are_stable_across_reloads() {
        let text = "title,needs,duration\nWalk,Rest,10\nNap,,20\n";
        let first = Catalog::parse(text, "ideas.csv", None).unwrap();
        let second = Catalog::parse(text, "ideas.csv", None).unwrap();

        let ids = |catalog: &Catalog| -> Vec<ItemId> {
            catalog.items().iter().map(|item| item.id.clone()).collect()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_ne!(first.items()[0].id, first.items()[1].id);
    }

    #[test]
    fn json_accepts_array_or_wrapper_object() {
        for text in [
            r#"[{"title":"a"}]"#,
            r#"{"ideas":[{"title":"a"}]}"#,
            r#"{"data":[{"title":"a"}]}"#,
        ] {
            let catalog = Catalog::parse(text, "", None).unwrap();
            assert_eq!(catalog.len(), 1, "{text}");
        }
    }

    #[test]
    fn json_needs_may_be_an_array() {
        let catalog =
            Catalog::parse(r#"[{"title":"a","needs":["Rest","Calm, Space"]}]"#, "", None).unwrap();
        assert_eq!(catalog.items()[0].needs.len(), 3);
    }

    #[test]
    fn invalid_json_names_the_source() {
        let error = Catalog::parse("[{", "ideas.json", None).unwrap_err();
        assert!(matches!(error, CatalogError::InvalidJson { .. }));
        assert!(error.to_string().contains("ideas.json"));
    }

    #[test]
    fn json_without_array_is_rejected() {
        let error = Catalog::parse(r#"{"items":[]}"#, "", None).unwrap_err();
        assert!(matches!(error, CatalogError::MissingArray));
    }

    #[test]
    fn later_duplicate_shadows_earlier() {
        let catalog =
            Catalog::parse("id,title\nx,First\ny,Other\nx,Second\n", "ideas.csv", None).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("x").unwrap().title, "Second");
        let titles: Vec<_> = catalog.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Other", "Second"]);
    }

    #[test]
    fn filtered_applies_filters() {
        let catalog = Catalog::parse(
            "title,category,duration\nA,Games,10\nB,Games,20\nC,Crafts,5\n",
            "ideas.csv",
            None,
        )
        .unwrap();
        let filters = Filters::new(15).with_category(Some("games".to_string()));

        let titles: Vec<_> = catalog
            .filtered(&filters)
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, ["A"]);
    }

    #[test]
    fn categories_are_sorted_and_distinct() {
        let catalog = Catalog::parse(
            "title,category\nA,Games\nB,crafts\nC,games\nD,\n",
            "ideas.csv",
            None,
        )
        .unwrap();
        assert_eq!(catalog.categories(), ["crafts", "Games"]);
    }

    #[test]
    fn needs_follow_vocabulary_order() {
        let catalog = Catalog::parse(
            r#"[{"title":"A","needs":["Rest","connection"]},{"title":"B","needs":"Rest"},{"title":"C"}]"#,
            "ideas.json",
            None,
        )
        .unwrap();
        let needs: Vec<_> = catalog.needs().iter().map(Need::as_str).collect();
        assert_eq!(needs, ["Connection", "Rest"]);
    }

    #[test]
    fn fetch_propagates_fetch_errors() {
        let fetcher = |location: &str| -> Result<String, FetchError> {
            Err(FetchError::Status {
                status: 404,
                location: location.to_string(),
            })
        };

        let error = Catalog::fetch(&fetcher, "https://example.com/ideas.csv").unwrap_err();
        assert_eq!(
            error.to_string(),
            "fetch failed (404) for https://example.com/ideas.csv"
        );
    }
}
