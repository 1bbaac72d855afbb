//! Keyword classification of spending categories

use std::collections::BTreeSet;

use crate::config::RecommendConfig;

/// Whether a category's spend is committed or discretionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryClass {
    /// Rent, insurance, subscriptions, taxes... never scaled down
    Fixed,
    /// Discretionary spend, scaled to fit the remaining budget
    Variable,
}

/// Classifies category names by case-insensitive substring matching
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    fixed: BTreeSet<String>,
    essential: BTreeSet<String>,
}

impl Classifier {
    pub fn new<S: AsRef<str>>(fixed: &[S], essential: &[S]) -> Self {
        Self {
            fixed: keyword_set(fixed),
            essential: keyword_set(essential),
        }
    }

    pub fn from_config(config: &RecommendConfig) -> Self {
        Self::new(&config.fixed_keywords, &config.essential_keywords)
    }

    pub fn classify(&self, category: &str) -> CategoryClass {
        if self.is_fixed(category) {
            CategoryClass::Fixed
        } else {
            CategoryClass::Variable
        }
    }

    pub fn is_fixed(&self, category: &str) -> bool {
        matches_any(category, &self.fixed)
    }

    /// Essential categories (food, transport, health) receive leftover budget
    pub fn is_essential(&self, category: &str) -> bool {
        matches_any(category, &self.essential)
    }
}

fn keyword_set<S: AsRef<str>>(keywords: &[S]) -> BTreeSet<String> {
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn matches_any(category: &str, keywords: &BTreeSet<String>) -> bool {
    let name = category.trim().to_lowercase();
    keywords.iter().any(|k| name.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_classifier() -> Classifier {
        Classifier::from_config(&RecommendConfig::embedded().unwrap())
    }

    #[test]
    fn test_fixed_categories() {
        let classifier = default_classifier();
        for name in [
            "Loyer",
            "Assurance habitation",
            "Mutuelle santé",
            "Abonnement Netflix",
            "Électricité",
            "Impôt sur le revenu",
            "Remboursement crédit auto",
            "Virement épargne",
            "Rent / Mortgage",
            "Internet",
        ] {
            assert_eq!(classifier.classify(name), CategoryClass::Fixed, "{}", name);
        }
    }

    #[test]
    fn test_variable_categories() {
        let classifier = default_classifier();
        for name in ["Alimentation", "Restaurants", "Loisirs", "Vêtements", "Taxi", "Cadeaux"] {
            assert_eq!(classifier.classify(name), CategoryClass::Variable, "{}", name);
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let classifier = default_classifier();
        assert!(classifier.is_fixed("  LOYER  "));
        assert!(classifier.is_fixed("loyer"));
        assert!(classifier.is_essential("  ALIMENTATION"));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = default_classifier();
        for name in ["Loyer", "Alimentation", "Uncategorized", ""] {
            assert_eq!(classifier.classify(name), classifier.classify(name));
        }
    }

    #[test]
    fn test_essential_keywords() {
        let classifier = default_classifier();
        assert!(classifier.is_essential("Alimentation"));
        assert!(classifier.is_essential("Transport en commun"));
        assert!(classifier.is_essential("Carburant"));
        assert!(!classifier.is_essential("Loisirs"));
    }

    #[test]
    fn test_custom_keywords() {
        let classifier = Classifier::new(&["gym"], &["cantine"]);
        assert!(classifier.is_fixed("Gym membership"));
        assert!(!classifier.is_fixed("Loyer"));
        assert!(classifier.is_essential("Cantine scolaire"));
    }

    #[test]
    fn test_empty_classifier_treats_everything_as_variable() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("Loyer"), CategoryClass::Variable);
        assert!(!classifier.is_essential("Alimentation"));
    }
}
