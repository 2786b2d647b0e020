use std::collections::BTreeMap;

use super::domain::{BudgetRequest, Category};
use super::policy::BudgetMode;
use super::registry::CategoryRegistry;
use super::solver::ConstraintOp;

/// Default minimum spend is half of a category's target share.
pub(crate) const MIN_SPEND_FACTOR: f64 = 0.5;

/// Near-zero ratio applied to rent when the user reports no rent obligation.
pub(crate) const WAIVED_RENT_RATIO: f64 = 0.01;

/// Below this income, entertainment spending is forced to zero.
pub(crate) const ENTERTAINMENT_SUPPRESSION_INCOME: f64 = 8_000.0;

/// Variable bounds for one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

/// A term in a planned constraint: a category variable or the remainder
/// slack. Ordered so category terms index before the slack variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Term {
    Category(Category),
    Remaining,
}

/// Named linear constraint over the plan's variables.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlannedConstraint {
    pub name: String,
    pub terms: Vec<(Term, f64)>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

/// Per-category bounds plus named constraints, ready for objective
/// composition. `remaining` records whether the slack variable exists.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModelPlan {
    pub bounds: BTreeMap<Category, Bounds>,
    pub constraints: Vec<PlannedConstraint>,
    pub remaining: bool,
    pub income: f64,
}

pub(crate) fn plan(
    registry: &CategoryRegistry,
    request: &BudgetRequest,
    rent_waived: bool,
) -> ModelPlan {
    let income = request.income();
    let suppress_entertainment = income < ENTERTAINMENT_SUPPRESSION_INCOME;

    let mut bounds = BTreeMap::new();
    for category in registry.categories() {
        let ratio = if rent_waived && category == Category::Rent {
            WAIVED_RENT_RATIO
        } else {
            registry.ratio(category)
        };
        let upper = income * ratio;
        // The rent waiver and the entertainment suppression both relax the
        // lower bound to zero; a minimum above a forced-zero spend would make
        // the model trivially infeasible.
        let lower = if (rent_waived && category == Category::Rent)
            || (suppress_entertainment && category == Category::Entertainment)
        {
            0.0
        } else {
            upper * MIN_SPEND_FACTOR
        };
        bounds.insert(category, Bounds { lower, upper });
    }

    let mut constraints = Vec::new();

    for category in registry.categories() {
        if !registry.is_essential(category) {
            continue;
        }
        if category == Category::Rent && rent_waived {
            continue;
        }
        let minimum = bounds[&category].lower;
        constraints.push(PlannedConstraint {
            name: format!("Min_{category}"),
            terms: vec![(Term::Category(category), 1.0)],
            op: ConstraintOp::GreaterEq,
            rhs: minimum,
        });
    }

    // Dominates the default savings minimum whenever the target is larger.
    constraints.push(PlannedConstraint {
        name: "Savings_Target".to_string(),
        terms: vec![(Term::Category(Category::Savings), 1.0)],
        op: ConstraintOp::GreaterEq,
        rhs: request.savings_target(),
    });

    if suppress_entertainment {
        constraints.push(PlannedConstraint {
            name: "No_Entertainment_If_Low_Income".to_string(),
            terms: vec![(Term::Category(Category::Entertainment), 1.0)],
            op: ConstraintOp::Eq,
            rhs: 0.0,
        });
    }

    let remaining = request.policy().budget_mode == BudgetMode::FullAllocation;
    let mut total_terms: Vec<(Term, f64)> = registry
        .categories()
        .map(|category| (Term::Category(category), 1.0))
        .collect();
    if remaining {
        total_terms.push((Term::Remaining, 1.0));
        constraints.push(PlannedConstraint {
            name: "Full_Allocation".to_string(),
            terms: total_terms,
            op: ConstraintOp::Eq,
            rhs: income,
        });
    } else {
        constraints.push(PlannedConstraint {
            name: "Budget_Limit".to_string(),
            terms: total_terms,
            op: ConstraintOp::LessEq,
            rhs: income,
        });
    }

    ModelPlan {
        bounds,
        constraints,
        remaining,
        income,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::policy::PolicyProfile;

    fn request(income: f64, savings_target: f64, policy: PolicyProfile) -> BudgetRequest {
        let registry = CategoryRegistry::standard();
        let ratings: BTreeMap<Category, u8> = Category::ordered()
            .into_iter()
            .map(|cat| (cat, 5))
            .collect();
        BudgetRequest::new(&registry, income, savings_target, ratings, policy)
            .expect("valid request")
    }

    fn named<'a>(plan: &'a ModelPlan, name: &str) -> Option<&'a PlannedConstraint> {
        plan.constraints.iter().find(|c| c.name == name)
    }

    #[test]
    fn default_bounds_are_half_to_full_share() {
        let registry = CategoryRegistry::standard();
        let plan = plan(&registry, &request(20_000.0, 0.0, PolicyProfile::legacy()), false);
        let rent = plan.bounds[&Category::Rent];
        assert!((rent.lower - 3_000.0).abs() < 1e-9);
        assert!((rent.upper - 6_000.0).abs() < 1e-9);
    }

    #[test]
    fn rent_waiver_overrides_rent_bounds_and_minimum() {
        let registry = CategoryRegistry::standard();
        let plan = plan(&registry, &request(15_000.0, 0.0, PolicyProfile::legacy()), true);
        let rent = plan.bounds[&Category::Rent];
        assert_eq!(rent.lower, 0.0);
        assert!((rent.upper - 150.0).abs() < 1e-9);
        assert!(named(&plan, "Min_Rent").is_none());
        assert!(named(&plan, "Min_Food").is_some());
    }

    #[test]
    fn minimum_rent_constraint_present_when_not_waived() {
        let registry = CategoryRegistry::standard();
        let plan = plan(&registry, &request(20_000.0, 0.0, PolicyProfile::legacy()), false);
        let min_rent = named(&plan, "Min_Rent").expect("rent minimum enforced");
        assert_eq!(min_rent.op, ConstraintOp::GreaterEq);
        assert!((min_rent.rhs - 3_000.0).abs() < 1e-9);
    }

    #[test]
    fn low_income_suppresses_entertainment_with_relaxed_lower_bound() {
        let registry = CategoryRegistry::standard();
        let plan = plan(&registry, &request(5_000.0, 0.0, PolicyProfile::legacy()), false);
        assert_eq!(plan.bounds[&Category::Entertainment].lower, 0.0);
        let suppression =
            named(&plan, "No_Entertainment_If_Low_Income").expect("suppression present");
        assert_eq!(suppression.op, ConstraintOp::Eq);
        assert_eq!(suppression.rhs, 0.0);
    }

    #[test]
    fn suppression_absent_at_or_above_cutoff() {
        let registry = CategoryRegistry::standard();
        let plan = plan(&registry, &request(8_000.0, 0.0, PolicyProfile::legacy()), false);
        assert!(named(&plan, "No_Entertainment_If_Low_Income").is_none());
    }

    #[test]
    fn savings_target_constraint_carries_requested_amount() {
        let registry = CategoryRegistry::standard();
        let plan = plan(&registry, &request(20_000.0, 3_000.0, PolicyProfile::legacy()), false);
        let target = named(&plan, "Savings_Target").expect("savings target present");
        assert!((target.rhs - 3_000.0).abs() < 1e-9);
    }

    #[test]
    fn ceiling_mode_emits_budget_limit_without_slack() {
        let registry = CategoryRegistry::standard();
        let plan = plan(&registry, &request(20_000.0, 0.0, PolicyProfile::legacy()), false);
        assert!(!plan.remaining);
        let limit = named(&plan, "Budget_Limit").expect("budget limit present");
        assert_eq!(limit.op, ConstraintOp::LessEq);
        assert_eq!(limit.terms.len(), 6);
    }

    #[test]
    fn full_allocation_mode_adds_remaining_term() {
        let registry = CategoryRegistry::standard();
        let plan = plan(&registry, &request(20_000.0, 0.0, PolicyProfile::tiered()), false);
        assert!(plan.remaining);
        let full = named(&plan, "Full_Allocation").expect("full allocation present");
        assert_eq!(full.op, ConstraintOp::Eq);
        assert!(full.terms.contains(&(Term::Remaining, 1.0)));
        assert!(named(&plan, "Budget_Limit").is_none());
    }

    #[test]
    fn terms_sort_categories_before_the_slack_variable() {
        let mut keys: std::collections::BTreeSet<Term> = Category::ordered()
            .into_iter()
            .map(Term::Category)
            .collect();
        keys.insert(Term::Remaining);
        assert_eq!(keys.iter().next(), Some(&Term::Category(Category::Rent)));
        assert_eq!(keys.iter().last(), Some(&Term::Remaining));
    }
}
