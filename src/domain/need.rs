use std::fmt;

use serde::{Serialize, Serializer};

/// Every need an idea can be tagged with, in display order.
const VOCABULARY: &[&str] = &[
    "Love/Caring",
    "Nurturing",
    "Connection",
    "Belonging",
    "Support",
    "Consideration",
    "Need for all living things to flourish",
    "Inclusion",
    "Community",
    "Safety",
    "Contribution",
    "Peer Respect",
    "Respect",
    "Autonomy",
    "To be seen",
    "Acknowledgement",
    "Appreciation",
    "Trust",
    "Dependability",
    "Honesty",
    "Honor",
    "Commitment",
    "Clarity",
    "Accountability",
    "Causality",
    "Fairness",
    "Justice",
    "Choice",
    "Freedom",
    "Reliability",
    "Act Freely",
    "Choose Freely",
    "Understanding",
    "Recognition",
    "Non-judgmental Communication",
    "Need to matter",
    "Friendship",
    "Space",
    "Peace",
    "Serenity",
    "Do things at my own pace and in my own way",
    "Calm",
    "Participation",
    "To be heard",
    "Equality",
    "Empowerment",
    "Consistency",
    "Genuineness",
    "Mattering",
    "Rest",
    "Mutuality",
    "Relaxation",
    "Closeness",
    "Authenticity",
    "Self expression",
    "Integrity",
    "Empathy",
    "Privacy",
    "Order",
    "Beauty",
    "Control",
    "Predictability",
    "Accomplishment",
    "Physical Fitness",
    "Acceptance",
    "Growth",
    "Security",
];

/// Alternative spellings accepted in source data, mapped to their canonical
/// need.
const ALIASES: &[(&str, &str)] = &[
    ("love", "Love/Caring"),
    ("caring", "Love/Caring"),
    ("fitness", "Physical Fitness"),
    ("exercise", "Physical Fitness"),
    ("seen", "To be seen"),
    ("heard", "To be heard"),
    ("self-expression", "Self expression"),
    ("own pace", "Do things at my own pace and in my own way"),
    ("acknowledgment", "Acknowledgement"),
    ("honour", "Honor"),
];

/// A canonical need from the closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Need(&'static str);

impl Need {
    /// Resolve a raw tag to its canonical need.
    ///
    /// Matching ignores case and surrounding whitespace, and accepts the
    /// aliases in the alias table. Returns `None` for tags outside the
    /// vocabulary.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        VOCABULARY
            .iter()
            .find(|need| need.to_lowercase() == key)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == key)
                    .map(|(_, canonical)| canonical)
            })
            .map(|need| Self(*need))
    }

    /// Resolve a list of tags, dropping unknown ones and duplicates.
    ///
    /// Unknown tags are reported with a warning.
    pub fn resolve_all<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        let mut needs = Vec::new();
        for tag in raw {
            match Self::parse(tag) {
                Some(need) if !needs.contains(&need) => needs.push(need),
                Some(_) => {}
                None => tracing::warn!("Dropping unrecognised need '{}'", tag.trim()),
            }
        }
        needs
    }

    /// Every need in the vocabulary, in display order.
    pub fn all() -> impl Iterator<Item = Self> {
        VOCABULARY.iter().copied().map(Self)
    }

    /// The canonical spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Whether this need equals `other`, ignoring case.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

impl fmt::Display for Need {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for Need {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("Connection", "Connection"; "exact")]
    #[test_case("connection", "Connection"; "lowercase")]
    #[test_case("  REST ", "Rest"; "padded uppercase")]
    #[test_case("exercise", "Physical Fitness"; "alias")]
    #[test_case("Love", "Love/Caring"; "alias ignores case")]
    fn parses_known_needs(raw: &str, expected: &str) {
        assert_eq!(Need::parse(raw).map(|n| n.as_str()), Some(expected));
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "blank")]
    #[test_case("Pizza"; "unknown")]
    fn rejects_unknown_needs(raw: &str) {
        assert_eq!(Need::parse(raw), None);
    }

    #[test]
    fn resolve_all_drops_unknown_and_duplicates() {
        let needs = Need::resolve_all(["rest", "Pizza", "Rest", "calm"]);
        let names: Vec<_> = needs.iter().map(Need::as_str).collect();
        assert_eq!(names, ["Rest", "Calm"]);
    }

    #[test]
    fn vocabulary_is_in_display_order() {
        assert_eq!(Need::all().next().map(|n| n.as_str()), Some("Love/Caring"));
        assert_eq!(Need::all().count(), VOCABULARY.len());
    }

    #[test]
    fn aliases_point_into_vocabulary() {
        for (_, canonical) in ALIASES {
            assert!(VOCABULARY.contains(canonical), "{canonical} is not canonical");
        }
    }
}
