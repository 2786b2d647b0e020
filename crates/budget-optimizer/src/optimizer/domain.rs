use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::policy::PolicyProfile;
use super::registry::CategoryRegistry;

/// Closed set of spending categories the engine can allocate toward.
///
/// Keeping this an enum (rather than free-form strings) means a typo can
/// never create an unconstrained solver variable; unknown names fail at
/// deserialization or validation time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    Rent,
    Food,
    Savings,
    Entertainment,
    Transport,
    Health,
}

impl Category {
    /// Registry iteration order, also the solver's variable order.
    pub fn ordered() -> [Category; 6] {
        [
            Category::Rent,
            Category::Food,
            Category::Savings,
            Category::Entertainment,
            Category::Transport,
            Category::Health,
        ]
    }

    /// Case-insensitive lookup by display label, for CLI-style inputs.
    pub fn from_label(value: &str) -> Option<Category> {
        Category::ordered()
            .into_iter()
            .find(|cat| cat.label().eq_ignore_ascii_case(value.trim()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Rent => "Rent",
            Category::Food => "Food",
            Category::Savings => "Savings",
            Category::Entertainment => "Entertainment",
            Category::Transport => "Transport",
            Category::Health => "Health",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw importance rating a user assigns to a category, 1 (least) to 10 (most).
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

/// Input rejected before any model is constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("income must be a positive amount, got {0}")]
    NonPositiveIncome(f64),
    #[error("savings target must be non-negative, got {0}")]
    NegativeSavingsTarget(f64),
    #[error("rating for {category} must be between {MIN_RATING} and {MAX_RATING}, got {value}")]
    RatingOutOfRange { category: Category, value: u8 },
    #[error("missing rating for {0}")]
    MissingRating(Category),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// Resolve string-keyed ratings (HTTP and CLI inputs) to category keys,
/// rejecting any label outside the closed set.
pub fn resolve_ratings<I>(ratings: I) -> Result<BTreeMap<Category, u8>, ValidationError>
where
    I: IntoIterator<Item = (String, u8)>,
{
    let mut resolved = BTreeMap::new();
    for (label, value) in ratings {
        let category =
            Category::from_label(&label).ok_or(ValidationError::UnknownCategory(label))?;
        resolved.insert(category, value);
    }
    Ok(resolved)
}

/// One optimization request: income, savings goal, per-category ratings, and
/// the policy profile selecting which variant of the model to build.
///
/// Construction validates everything, so a `BudgetRequest` in hand is always
/// safe to turn into a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRequest {
    income: f64,
    savings_target: f64,
    ratings: BTreeMap<Category, u8>,
    policy: PolicyProfile,
}

fn validate(
    registry: &CategoryRegistry,
    income: f64,
    savings_target: f64,
    ratings: &BTreeMap<Category, u8>,
) -> Result<(), ValidationError> {
    if !income.is_finite() || income <= 0.0 {
        return Err(ValidationError::NonPositiveIncome(income));
    }
    if !savings_target.is_finite() || savings_target < 0.0 {
        return Err(ValidationError::NegativeSavingsTarget(savings_target));
    }
    for category in registry.categories() {
        match ratings.get(&category) {
            None => return Err(ValidationError::MissingRating(category)),
            Some(&value) if !(MIN_RATING..=MAX_RATING).contains(&value) => {
                return Err(ValidationError::RatingOutOfRange { category, value });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

impl BudgetRequest {
    pub fn new(
        registry: &CategoryRegistry,
        income: f64,
        savings_target: f64,
        ratings: BTreeMap<Category, u8>,
        policy: PolicyProfile,
    ) -> Result<Self, ValidationError> {
        validate(registry, income, savings_target, &ratings)?;
        Ok(Self {
            income,
            savings_target,
            ratings,
            policy,
        })
    }

    /// Fail-fast guard for requests deserialized or built against another
    /// registry than the engine's own.
    pub(crate) fn validate_against(
        &self,
        registry: &CategoryRegistry,
    ) -> Result<(), ValidationError> {
        validate(registry, self.income, self.savings_target, &self.ratings)
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn savings_target(&self) -> f64 {
        self.savings_target
    }

    pub fn policy(&self) -> &PolicyProfile {
        &self.policy
    }

    /// Rating for a category; defaults to the minimum when the registry and
    /// request disagree (cannot happen for requests built through `new`).
    pub fn rating(&self, category: Category) -> u8 {
        self.ratings.get(&category).copied().unwrap_or(MIN_RATING)
    }
}

/// Solved, validated allocation of income to categories.
///
/// Zero-valued categories are retained; filtering them (for pie charts and
/// the like) is the renderer's concern, not the engine's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    amounts: BTreeMap<Category, f64>,
    /// Voluntarily unspent income; present exactly under full-allocation mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    unallocated: Option<f64>,
}

impl Allocation {
    pub(crate) fn new(amounts: BTreeMap<Category, f64>, unallocated: Option<f64>) -> Self {
        Self {
            amounts,
            unallocated,
        }
    }

    pub fn amount(&self, category: Category) -> f64 {
        self.amounts.get(&category).copied().unwrap_or(0.0)
    }

    pub fn entries(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.amounts.iter().map(|(category, amount)| (*category, *amount))
    }

    pub fn unallocated(&self) -> Option<f64> {
        self.unallocated
    }

    pub fn total_allocated(&self) -> f64 {
        self.amounts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::registry::CategoryRegistry;

    fn ratings(value: u8) -> BTreeMap<Category, u8> {
        Category::ordered().into_iter().map(|cat| (cat, value)).collect()
    }

    #[test]
    fn rejects_non_positive_income() {
        let registry = CategoryRegistry::standard();
        let err = BudgetRequest::new(&registry, 0.0, 0.0, ratings(5), PolicyProfile::default())
            .expect_err("zero income rejected");
        assert_eq!(err, ValidationError::NonPositiveIncome(0.0));
    }

    #[test]
    fn rejects_negative_savings_target() {
        let registry = CategoryRegistry::standard();
        let err =
            BudgetRequest::new(&registry, 1000.0, -1.0, ratings(5), PolicyProfile::default())
                .expect_err("negative savings target rejected");
        assert_eq!(err, ValidationError::NegativeSavingsTarget(-1.0));
    }

    #[test]
    fn rejects_out_of_range_rating() {
        let registry = CategoryRegistry::standard();
        let mut bad = ratings(5);
        bad.insert(Category::Food, 11);
        let err = BudgetRequest::new(&registry, 1000.0, 0.0, bad, PolicyProfile::default())
            .expect_err("rating above 10 rejected");
        assert_eq!(
            err,
            ValidationError::RatingOutOfRange {
                category: Category::Food,
                value: 11
            }
        );
    }

    #[test]
    fn rejects_missing_rating() {
        let registry = CategoryRegistry::standard();
        let mut partial = ratings(5);
        partial.remove(&Category::Health);
        let err = BudgetRequest::new(&registry, 1000.0, 0.0, partial, PolicyProfile::default())
            .expect_err("missing category rejected");
        assert_eq!(err, ValidationError::MissingRating(Category::Health));
    }

    #[test]
    fn resolves_ratings_case_insensitively() {
        let resolved = resolve_ratings([("food".to_string(), 7), ("Rent".to_string(), 4)])
            .expect("known labels resolve");
        assert_eq!(resolved.get(&Category::Food), Some(&7));
        assert_eq!(resolved.get(&Category::Rent), Some(&4));
    }

    #[test]
    fn rejects_unknown_category_label() {
        let err = resolve_ratings([("Laundry".to_string(), 5)]).expect_err("unknown label");
        assert_eq!(err, ValidationError::UnknownCategory("Laundry".to_string()));
    }

    #[test]
    fn rejects_non_finite_income() {
        let registry = CategoryRegistry::standard();
        assert!(BudgetRequest::new(
            &registry,
            f64::NAN,
            0.0,
            ratings(5),
            PolicyProfile::default()
        )
        .is_err());
    }

    #[test]
    fn allocation_total_excludes_unallocated() {
        let mut amounts = BTreeMap::new();
        amounts.insert(Category::Food, 400.0);
        amounts.insert(Category::Rent, 600.0);
        let allocation = Allocation::new(amounts, Some(250.0));
        assert!((allocation.total_allocated() - 1000.0).abs() < f64::EPSILON);
        assert_eq!(allocation.unallocated(), Some(250.0));
    }
}
