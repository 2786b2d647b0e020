use std::collections::BTreeMap;

use super::domain::{BudgetRequest, Category};
use super::policy::UtilityMode;

/// A rent rating at or below this is read as "no rent obligation".
pub(crate) const NO_RENT_RATING_CEILING: u8 = 2;

/// Treating "no rent" as a structural change (zero weight, near-zero bounds)
/// rather than a low weight keeps the solver from parking money against
/// rent's lower bound when the user has none.
pub(crate) fn rent_waived(request: &BudgetRequest) -> bool {
    request.rating(Category::Rent) <= NO_RENT_RATING_CEILING
}

fn income_tier_factor(income: f64) -> f64 {
    if income < 10_000.0 {
        0.7
    } else if income < 30_000.0 {
        0.9
    } else {
        1.1
    }
}

fn base_weight(mode: UtilityMode, rating: u8, income: f64) -> f64 {
    match mode {
        UtilityMode::Direct => f64::from(rating),
        UtilityMode::NormalizedTiered => {
            let normalized = 0.5 + f64::from(rating - 1) / 9.0;
            normalized * income_tier_factor(income)
        }
    }
}

/// Utility weight per category, with the rent waiver applied: rent's weight
/// drops to zero and every other category gains the profile's flat boost.
pub(crate) fn weights(request: &BudgetRequest, rent_waived: bool) -> BTreeMap<Category, f64> {
    let policy = request.policy();
    let boost = policy.rent_boost.magnitude();

    Category::ordered()
        .into_iter()
        .map(|category| {
            let weight = if rent_waived && category == Category::Rent {
                0.0
            } else {
                let base = base_weight(policy.utility_mode, request.rating(category), request.income());
                if rent_waived {
                    base + boost
                } else {
                    base
                }
            };
            (category, weight)
        })
        .collect()
}
