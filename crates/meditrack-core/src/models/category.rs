//! Medical-history categories and their static registry.

use serde::{Deserialize, Serialize};

/// Medical-history record category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Diagnosis,
    FollowUp,
    Surgery,
    Chemotherapy,
    Radiotherapy,
    Immunotherapy,
    Hospitalization,
    LabTest,
    Imaging,
    Consultation,
    Other,
}

impl Category {
    /// Every category, in registry order.
    pub const ALL: [Category; 11] = [
        Category::Diagnosis,
        Category::FollowUp,
        Category::Surgery,
        Category::Chemotherapy,
        Category::Radiotherapy,
        Category::Immunotherapy,
        Category::Hospitalization,
        Category::LabTest,
        Category::Imaging,
        Category::Consultation,
        Category::Other,
    ];

    /// Wire name (e.g. `follow_up`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Diagnosis => "diagnosis",
            Category::FollowUp => "follow_up",
            Category::Surgery => "surgery",
            Category::Chemotherapy => "chemotherapy",
            Category::Radiotherapy => "radiotherapy",
            Category::Immunotherapy => "immunotherapy",
            Category::Hospitalization => "hospitalization",
            Category::LabTest => "lab_test",
            Category::Imaging => "imaging",
            Category::Consultation => "consultation",
            Category::Other => "other",
        }
    }

    /// Parse a wire name.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw)
    }

    /// Registry entry for this category.
    pub fn config(self) -> &'static CategoryConfig {
        CategoryRegistry::global().get(self)
    }

    /// Temporal shape declared by the registry.
    pub fn temporal_kind(self) -> TemporalKind {
        self.config().temporal_kind
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an event is pinned to a date or spans a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalKind {
    Point,
    Continuous,
}

impl TemporalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalKind::Point => "point",
            TemporalKind::Continuous => "continuous",
        }
    }
}

/// Static description of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    pub category: Category,
    /// Default display name
    pub name: &'static str,
    /// Localization key for the display name
    pub translation_key: &'static str,
    pub temporal_kind: TemporalKind,
    /// Whether a free-text `treatment` field applies
    pub supports_treatment_field: bool,
    /// Whether a free-text `notes` field applies
    pub supports_notes_field: bool,
}

/// Immutable category table, built once and shared by reference.
#[derive(Debug)]
pub struct CategoryRegistry {
    entries: [CategoryConfig; 11],
}

const fn entry(
    category: Category,
    name: &'static str,
    translation_key: &'static str,
    temporal_kind: TemporalKind,
    supports_treatment_field: bool,
) -> CategoryConfig {
    CategoryConfig {
        category,
        name,
        translation_key,
        temporal_kind,
        supports_treatment_field,
        supports_notes_field: true,
    }
}

static REGISTRY: CategoryRegistry = CategoryRegistry {
    entries: [
        entry(Category::Diagnosis, "Diagnosis", "categories.diagnosis", TemporalKind::Point, false),
        entry(Category::FollowUp, "Follow-up Visit", "categories.followUp", TemporalKind::Point, false),
        entry(Category::Surgery, "Surgery", "categories.surgery", TemporalKind::Continuous, true),
        entry(Category::Chemotherapy, "Chemotherapy", "categories.chemotherapy", TemporalKind::Continuous, true),
        entry(Category::Radiotherapy, "Radiotherapy", "categories.radiotherapy", TemporalKind::Continuous, true),
        entry(Category::Immunotherapy, "Immunotherapy", "categories.immunotherapy", TemporalKind::Continuous, true),
        entry(Category::Hospitalization, "Hospitalization", "categories.hospitalization", TemporalKind::Continuous, false),
        entry(Category::LabTest, "Lab Test", "categories.labTest", TemporalKind::Point, false),
        entry(Category::Imaging, "Imaging", "categories.imaging", TemporalKind::Point, false),
        entry(Category::Consultation, "Consultation", "categories.consultation", TemporalKind::Point, true),
        entry(Category::Other, "Other", "categories.other", TemporalKind::Point, true),
    ],
};

impl CategoryRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static CategoryRegistry {
        &REGISTRY
    }

    /// Entry for `category`. Total over the enum.
    pub fn get(&self, category: Category) -> &CategoryConfig {
        &self.entries[category.index()]
    }

    /// All entries in registry order.
    pub fn all(&self) -> impl Iterator<Item = &CategoryConfig> {
        self.entries.iter()
    }

    /// Categories declared with the given temporal kind.
    pub fn categories_of_kind(&self, kind: TemporalKind) -> impl Iterator<Item = Category> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.temporal_kind == kind)
            .map(|e| e.category)
    }
}

/// Category filter applied to a record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Whether records of `category` pass this filter.
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(only) => *only == category,
        }
    }

    /// Parse `all` or a category wire name.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "all" {
            Some(CategoryFilter::All)
        } else {
            Category::parse(raw).map(CategoryFilter::Only)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_matches_enum() {
        let registry = CategoryRegistry::global();
        for (entry, category) in registry.all().zip(Category::ALL) {
            assert_eq!(entry.category, category);
            assert_eq!(registry.get(category).category, category);
        }
        assert_eq!(registry.all().count(), 11);
    }

    #[test]
    fn test_continuous_categories() {
        let continuous: Vec<Category> = CategoryRegistry::global()
            .categories_of_kind(TemporalKind::Continuous)
            .collect();
        assert_eq!(
            continuous,
            vec![
                Category::Surgery,
                Category::Chemotherapy,
                Category::Radiotherapy,
                Category::Immunotherapy,
                Category::Hospitalization,
            ]
        );
    }

    #[test]
    fn test_treatment_support() {
        assert!(!Category::Diagnosis.config().supports_treatment_field);
        assert!(!Category::Hospitalization.config().supports_treatment_field);
        assert!(Category::Consultation.config().supports_treatment_field);
        assert!(Category::ALL.iter().all(|c| c.config().supports_notes_field));
    }

    #[test]
    fn test_wire_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
        assert_eq!(Category::parse("dentistry"), None);
    }

    #[test]
    fn test_filter() {
        assert!(CategoryFilter::All.matches(Category::Imaging));
        assert!(CategoryFilter::Only(Category::Imaging).matches(Category::Imaging));
        assert!(!CategoryFilter::Only(Category::Imaging).matches(Category::Surgery));
        assert_eq!(CategoryFilter::parse("all"), Some(CategoryFilter::All));
        assert_eq!(
            CategoryFilter::parse("lab_test"),
            Some(CategoryFilter::Only(Category::LabTest))
        );
        assert_eq!(CategoryFilter::parse("everything"), None);
    }
}
