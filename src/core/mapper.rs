use crate::domain::model::{CanonicalField, ColumnMap, MappedColumn};

pub use crate::domain::model::TieBreak;

type LabelPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

pub struct FieldRule {
    field: CanonicalField,
    predicate: LabelPredicate,
}

impl FieldRule {
    pub fn new<F>(field: CanonicalField, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            field,
            predicate: Box::new(predicate),
        }
    }

    /// Matches any normalized label containing `token`.
    pub fn contains(field: CanonicalField, token: &'static str) -> Self {
        Self::new(field, move |label| label.contains(token))
    }

    pub fn field(&self) -> CanonicalField {
        self.field
    }

    pub fn matches(&self, normalized_label: &str) -> bool {
        (self.predicate)(normalized_label)
    }
}

/// Trim, lowercase and turn spaces into underscores.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Infers which source column holds each canonical field.
///
/// Rules are evaluated in order against every normalized label. A label can
/// satisfy more than one rule (`country_name` feeds both `name` and
/// `country`). Matching is deliberately coarse: `username` maps to `name` and
/// `age_group` maps to `age`.
pub struct ColumnMapper {
    rules: Vec<FieldRule>,
    tie_break: TieBreak,
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new(TieBreak::default())
    }
}

impl ColumnMapper {
    pub fn new(tie_break: TieBreak) -> Self {
        Self::with_rules(
            CanonicalField::ALL
                .into_iter()
                .map(|field| FieldRule::contains(field, field.as_str()))
                .collect(),
            tie_break,
        )
    }

    pub fn with_rules(rules: Vec<FieldRule>, tie_break: TieBreak) -> Self {
        Self { rules, tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn infer<S: AsRef<str>>(&self, labels: &[S]) -> ColumnMap {
        let mut map = ColumnMap::default();

        for (index, raw) in labels.iter().enumerate() {
            let label = normalize_label(raw.as_ref());
            for rule in &self.rules {
                if !rule.matches(&label) {
                    continue;
                }
                if self.tie_break == TieBreak::FirstWins && map.contains(rule.field()) {
                    continue;
                }
                map.insert(
                    rule.field(),
                    MappedColumn {
                        index,
                        label: label.clone(),
                    },
                );
            }
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label(" FULL NAME "), "full_name");
        assert_eq!(normalize_label("Email Address"), "email_address");
        assert_eq!(normalize_label("country"), "country");
    }

    #[test]
    fn test_infer_exact_headers() {
        let map = ColumnMapper::default().infer(&["Name", "Age", "Email", "Country"]);

        assert!(map.is_complete());
        assert_eq!(map.label(CanonicalField::Name), Some("name"));
        assert_eq!(map.get(CanonicalField::Age).unwrap().index, 1);
        assert_eq!(map.get(CanonicalField::Country).unwrap().index, 3);
    }

    #[test]
    fn test_name_variants_normalize_to_same_field() {
        let mapper = ColumnMapper::default();
        for label in ["Full Name", "full_name", " FULL NAME "] {
            let map = mapper.infer(&[label]);
            assert_eq!(map.len(), 1, "label {:?}", label);
            assert_eq!(map.label(CanonicalField::Name), Some("full_name"));
        }
    }

    #[test]
    fn test_substring_matching_is_coarse() {
        let map = ColumnMapper::default().infer(&["username", "age_group"]);
        assert_eq!(map.label(CanonicalField::Name), Some("username"));
        assert_eq!(map.label(CanonicalField::Age), Some("age_group"));
    }

    #[test]
    fn test_one_label_can_feed_two_fields() {
        let map = ColumnMapper::default().infer(&["Country Name"]);
        assert_eq!(map.label(CanonicalField::Name), Some("country_name"));
        assert_eq!(map.label(CanonicalField::Country), Some("country_name"));
    }

    #[test]
    fn test_last_match_wins_by_default() {
        let map = ColumnMapper::default().infer(&["first_name", "last_name", "age"]);
        let name = map.get(CanonicalField::Name).unwrap();
        assert_eq!(name.label, "last_name");
        assert_eq!(name.index, 1);
    }

    #[test]
    fn test_first_wins_tie_break() {
        let map = ColumnMapper::new(TieBreak::FirstWins).infer(&["first_name", "last_name"]);
        assert_eq!(map.label(CanonicalField::Name), Some("first_name"));
    }

    #[test]
    fn test_missing_fields_are_not_errors() {
        let map = ColumnMapper::default().infer(&["id", "city", "phone"]);
        assert!(map.is_empty());

        let map = ColumnMapper::default().infer::<&str>(&[]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_custom_rules() {
        let rules = vec![
            FieldRule::new(CanonicalField::Email, |l| l == "mail" || l.contains("email")),
            FieldRule::contains(CanonicalField::Country, "nation"),
        ];
        let map = ColumnMapper::with_rules(rules, TieBreak::LastWins).infer(&["Mail", "Nationality"]);

        assert_eq!(map.label(CanonicalField::Email), Some("mail"));
        assert_eq!(map.label(CanonicalField::Country), Some("nationality"));
        assert!(!map.contains(CanonicalField::Name));
    }

    #[test]
    fn test_tie_break_deserializes_from_short_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            tie_break: TieBreak,
        }
        let w: Wrapper = toml::from_str("tie_break = \"first\"").unwrap();
        assert_eq!(w.tie_break, TieBreak::FirstWins);
        let w: Wrapper = toml::from_str("tie_break = \"last_wins\"").unwrap();
        assert_eq!(w.tie_break, TieBreak::LastWins);
    }
}
