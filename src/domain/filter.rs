use crate::domain::Item;

/// Predicates narrowing the catalog down to draw candidates.
///
/// Category and need comparisons ignore case. An empty or missing category
/// or need matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    category: Option<String>,
    need: Option<String>,
    max_duration: u32,
}

impl Filters {
    /// Creates filters admitting every item up to `max_duration` minutes.
    #[must_use]
    pub const fn new(max_duration: u32) -> Self {
        Self {
            category: None,
            need: None,
            max_duration,
        }
    }

    /// Restricts to a single category.
    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = normalise(category);
        self
    }

    /// Restricts to items tagged with a need.
    #[must_use]
    pub fn with_need(mut self, need: Option<String>) -> Self {
        self.need = normalise(need);
        self
    }

    /// The active category filter, lowercased.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// The active need filter, lowercased.
    #[must_use]
    pub fn need(&self) -> Option<&str> {
        self.need.as_deref()
    }

    /// Longest admitted duration, in minutes.
    #[must_use]
    pub const fn max_duration(&self) -> u32 {
        self.max_duration
    }

    /// Whether an item passes every predicate.
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(category) = &self.category {
            let item_category = item.category.as_deref().unwrap_or_default().to_lowercase();
            if &item_category != category {
                return false;
            }
        }

        if let Some(need) = &self.need {
            if !item.needs.iter().any(|n| n.matches(need)) {
                return false;
            }
        }

        item.duration_minutes <= self.max_duration
    }
}

fn normalise(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, Need};

    fn item(category: Option<&str>, needs: &[&str], duration: u32) -> Item {
        Item {
            id: ItemId::new("x"),
            title: "Idea".to_string(),
            description: String::new(),
            category: category.map(str::to_string),
            needs: Need::resolve_all(needs.iter().copied()),
            duration_minutes: duration,
            energy: None,
            link: None,
            link_label: None,
        }
    }

    #[test]
    fn duration_is_inclusive_upper_bound() {
        let filters = Filters::new(15);
        assert!(filters.matches(&item(None, &[], 15)));
        assert!(!filters.matches(&item(None, &[], 16)));
    }

    #[test]
    fn category_ignores_case() {
        let filters = Filters::new(60).with_category(Some("GAMES".to_string()));
        assert!(filters.matches(&item(Some("Games"), &[], 5)));
        assert!(!filters.matches(&item(Some("Crafts"), &[], 5)));
        assert!(!filters.matches(&item(None, &[], 5)));
    }

    #[test]
    fn need_matches_any_tag() {
        let filters = Filters::new(60).with_need(Some("rest".to_string()));
        assert!(filters.matches(&item(None, &["Calm", "Rest"], 5)));
        assert!(!filters.matches(&item(None, &["Calm"], 5)));
    }

    #[test]
    fn blank_selections_match_everything() {
        let filters = Filters::new(60)
            .with_category(Some("  ".to_string()))
            .with_need(Some(String::new()));
        assert_eq!(filters.category(), None);
        assert_eq!(filters.need(), None);
        assert!(filters.matches(&item(None, &[], 5)));
    }
}
