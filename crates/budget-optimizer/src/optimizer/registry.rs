use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::Category;

/// Default allocation behavior for one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefaults {
    /// Fraction of income forming the category's spending ceiling.
    pub ratio: f64,
    /// Essential categories carry an enforced minimum-spend constraint.
    pub essential: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("allocation ratio for {category} must lie in 0..=1, got {ratio}")]
    RatioOutOfRange { category: Category, ratio: f64 },
    #[error("registry has no entry for {0}")]
    MissingCategory(Category),
}

/// Immutable per-category configuration injected into the engine.
///
/// Tests substitute custom registries (different ratios, different essential
/// sets) without touching any global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRegistry {
    entries: BTreeMap<Category, CategoryDefaults>,
}

impl CategoryRegistry {
    /// Build a registry covering every category.
    pub fn new(entries: BTreeMap<Category, CategoryDefaults>) -> Result<Self, RegistryError> {
        for category in Category::ordered() {
            let defaults = entries
                .get(&category)
                .ok_or(RegistryError::MissingCategory(category))?;
            if !defaults.ratio.is_finite() || !(0.0..=1.0).contains(&defaults.ratio) {
                return Err(RegistryError::RatioOutOfRange {
                    category,
                    ratio: defaults.ratio,
                });
            }
        }
        Ok(Self { entries })
    }

    /// The observed production defaults: ratios summing to 1.0 and the
    /// essential set {Rent, Food, Savings, Health, Transport}.
    pub fn standard() -> Self {
        let mut entries = BTreeMap::new();
        let defaults = [
            (Category::Rent, 0.30, true),
            (Category::Food, 0.20, true),
            (Category::Savings, 0.20, true),
            (Category::Entertainment, 0.10, false),
            (Category::Transport, 0.10, true),
            (Category::Health, 0.10, true),
        ];
        for (category, ratio, essential) in defaults {
            entries.insert(category, CategoryDefaults { ratio, essential });
        }
        Self { entries }
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.keys().copied()
    }

    pub fn ratio(&self, category: Category) -> f64 {
        self.entries
            .get(&category)
            .map(|defaults| defaults.ratio)
            .unwrap_or(0.0)
    }

    pub fn is_essential(&self, category: Category) -> bool {
        self.entries
            .get(&category)
            .map(|defaults| defaults.essential)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ratios_sum_to_one() {
        let registry = CategoryRegistry::standard();
        let total: f64 = Category::ordered()
            .into_iter()
            .map(|cat| registry.ratio(cat))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn standard_essential_set_excludes_entertainment() {
        let registry = CategoryRegistry::standard();
        assert!(registry.is_essential(Category::Rent));
        assert!(registry.is_essential(Category::Savings));
        assert!(!registry.is_essential(Category::Entertainment));
    }

    #[test]
    fn rejects_ratio_above_one() {
        let mut entries = BTreeMap::new();
        for category in Category::ordered() {
            entries.insert(
                category,
                CategoryDefaults {
                    ratio: 0.1,
                    essential: false,
                },
            );
        }
        entries.insert(
            Category::Rent,
            CategoryDefaults {
                ratio: 1.5,
                essential: true,
            },
        );
        let err = CategoryRegistry::new(entries).expect_err("ratio above 1 rejected");
        assert_eq!(
            err,
            RegistryError::RatioOutOfRange {
                category: Category::Rent,
                ratio: 1.5
            }
        );
    }

    #[test]
    fn rejects_incomplete_registry() {
        let mut entries = BTreeMap::new();
        entries.insert(
            Category::Rent,
            CategoryDefaults {
                ratio: 0.3,
                essential: true,
            },
        );
        let err = CategoryRegistry::new(entries).expect_err("partial registry rejected");
        assert!(matches!(err, RegistryError::MissingCategory(_)));
    }
}
