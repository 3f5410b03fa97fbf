//! Indicator catalog
//!
//! The checklist of authorship cues a reviewer can flag on the label form.
//! Loaded once per session from a TOML file; when no file is configured or
//! the file is unusable, a built-in default set derived from the scorer's
//! analysis checklist is substituted so labeling is never blocked.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gcda_common::{Error, Result};

/// One selectable authorship cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorItem {
    /// Stable identifier used on the wire and in drafts
    pub id: String,
    /// Reviewer-facing description
    pub label: String,
    /// Optional grouping for richer surfaces
    pub category: Option<String>,
}

/// Indicator families available to the label form
///
/// Read-only after load. Ids are unique within each family; ids arriving
/// from the scorer that are absent here are tolerated by the draft (catalog
/// and scorer versions may drift).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorCatalog {
    #[serde(default)]
    pub ai_indicators: Vec<IndicatorItem>,
    #[serde(default)]
    pub human_indicators: Vec<IndicatorItem>,
}

impl IndicatorCatalog {
    /// Load a catalog, falling back to the built-in defaults
    ///
    /// `None` means no file is configured. A missing, unreadable, or
    /// invalid file is logged and replaced by the defaults; absence of
    /// catalog data never blocks labeling.
    pub fn load(path: Option<&Path>) -> IndicatorCatalog {
        let path = match path {
            Some(p) => p,
            None => return Self::default_set(),
        };
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(catalog) => {
                    info!(
                        ai = catalog.ai_indicators.len(),
                        human = catalog.human_indicators.len(),
                        "Loaded indicator catalog from {:?}",
                        path
                    );
                    catalog
                }
                Err(e) => {
                    warn!("Falling back to built-in indicators: {}", e);
                    Self::default_set()
                }
            },
            Err(e) => {
                warn!(
                    "Could not read catalog file {:?} ({}); using built-in indicators",
                    path, e
                );
                Self::default_set()
            }
        }
    }

    /// Parse and validate a TOML catalog document
    pub fn parse(content: &str) -> Result<IndicatorCatalog> {
        let catalog: IndicatorCatalog =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid catalog file: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Built-in default indicator set
    pub fn default_set() -> IndicatorCatalog {
        DEFAULT_CATALOG.clone()
    }

    /// Look up an indicator's reviewer-facing label in either family
    pub fn label_for(&self, id: &str) -> Option<&str> {
        self.ai_indicators
            .iter()
            .chain(self.human_indicators.iter())
            .find(|item| item.id == id)
            .map(|item| item.label.as_str())
    }

    fn validate(&self) -> Result<()> {
        if self.ai_indicators.is_empty() && self.human_indicators.is_empty() {
            return Err(Error::Config("Catalog defines no indicators".to_string()));
        }
        for (family, items) in [
            ("ai", &self.ai_indicators),
            ("human", &self.human_indicators),
        ] {
            let mut seen = HashSet::new();
            for item in items {
                if item.id.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "Empty indicator id in {} family",
                        family
                    )));
                }
                if !seen.insert(item.id.as_str()) {
                    return Err(Error::Config(format!(
                        "Duplicate indicator id '{}' in {} family",
                        item.id, family
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Defaults mirror the scorer's own analysis checklist, so preselection
/// results resolve to known checkboxes out of the box.
static DEFAULT_CATALOG: Lazy<IndicatorCatalog> = Lazy::new(|| {
    let item = |id: &str, label: &str| IndicatorItem {
        id: id.to_string(),
        label: label.to_string(),
        category: None,
    };
    IndicatorCatalog {
        ai_indicators: vec![
            item("repetitive_patterns", "Repetitive or formulaic language patterns"),
            item("perfect_grammar", "Overly perfect grammar with no colloquialisms"),
            item("generic_phrasing", "Generic or template-like phrasing"),
            item("no_personal_details", "Lack of personal anecdotes or specific details"),
            item("unnatural_transitions", "Unnatural transitions between topics"),
            item("overly_balanced", "Overly balanced or comprehensive coverage"),
            item("uniform_formal_tone", "Formal tone throughout without variation"),
            item("structured_lists", "Lists or structured formats without personal touches"),
            item("generic_examples", "Generic examples or hypothetical scenarios"),
        ],
        human_indicators: vec![
            item("personal_anecdotes", "Personal experiences or anecdotes"),
            item("colloquial_language", "Colloquial language or slang"),
            item("minor_typos", "Minor grammatical errors or typos"),
            item("emotional_language", "Emotional language or subjective opinions"),
            item("specific_details", "Specific details or unique perspectives"),
            item("conversational_variation", "Conversational tone variations"),
            item("cultural_references", "Cultural references or inside jokes"),
            item("inconsistent_style", "Inconsistent writing style or voice changes"),
            item("personal_tangents", "Spontaneous tangents or personal asides"),
        ],
    }
});

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_families() {
        let catalog = IndicatorCatalog::default_set();
        assert_eq!(catalog.ai_indicators.len(), 9);
        assert_eq!(catalog.human_indicators.len(), 9);
        catalog.validate().unwrap();
    }

    #[test]
    fn test_parse_valid_catalog() {
        let catalog = IndicatorCatalog::parse(
            r#"
            [[ai_indicators]]
            id = "perfect_grammar"
            label = "Overly perfect grammar"

            [[human_indicators]]
            id = "minor_typos"
            label = "Minor typos"
            category = "style"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.ai_indicators.len(), 1);
        assert_eq!(
            catalog.human_indicators[0].category.as_deref(),
            Some("style")
        );
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        let err = IndicatorCatalog::parse(
            r#"
            [[ai_indicators]]
            id = "dup"
            label = "One"

            [[ai_indicators]]
            id = "dup"
            label = "Two"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_rejects_empty_catalog() {
        assert!(IndicatorCatalog::parse("").is_err());
    }

    #[test]
    fn test_duplicate_across_families_is_allowed() {
        // Families are independent id namespaces
        let catalog = IndicatorCatalog::parse(
            r#"
            [[ai_indicators]]
            id = "shared"
            label = "AI view"

            [[human_indicators]]
            id = "shared"
            label = "Human view"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.ai_indicators.len(), 1);
        assert_eq!(catalog.human_indicators.len(), 1);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let catalog = IndicatorCatalog::load(Some(Path::new("/nonexistent/catalog.toml")));
        assert_eq!(catalog, IndicatorCatalog::default_set());
    }

    #[test]
    fn test_load_unconfigured_uses_defaults() {
        let catalog = IndicatorCatalog::load(None);
        assert_eq!(catalog, IndicatorCatalog::default_set());
    }

    #[test]
    fn test_label_lookup() {
        let catalog = IndicatorCatalog::default_set();
        assert_eq!(
            catalog.label_for("minor_typos"),
            Some("Minor grammatical errors or typos")
        );
        assert!(catalog.label_for("unknown_cue").is_none());
    }
}
