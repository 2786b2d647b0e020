use std::collections::BTreeMap;

use super::constraints::{ModelPlan, Term};
use super::domain::Category;
use super::solver::{LpConstraint, LpModel, LpVariableSpec};

/// Tie-breaking penalty on the unspent remainder under full-allocation mode.
/// Orders of magnitude below any utility weight times a currency unit, so it
/// never distorts category-level trade-offs.
pub(crate) const REMAINING_PENALTY: f64 = 0.001;

pub(crate) const REMAINING_LABEL: &str = "Unallocated";

/// Flatten the plan and utility weights into an indexed maximization model:
/// category variables in registry order, the remainder slack (if any) last.
pub(crate) fn compose(plan: &ModelPlan, weights: &BTreeMap<Category, f64>) -> LpModel {
    let mut variables = Vec::with_capacity(plan.bounds.len() + 1);
    let mut index_of = BTreeMap::new();

    for (category, bounds) in &plan.bounds {
        index_of.insert(Term::Category(*category), variables.len());
        variables.push(LpVariableSpec {
            label: category.label().to_string(),
            lower: bounds.lower,
            upper: bounds.upper,
            objective: weights.get(category).copied().unwrap_or(0.0),
        });
    }

    if plan.remaining {
        index_of.insert(Term::Remaining, variables.len());
        variables.push(LpVariableSpec {
            label: REMAINING_LABEL.to_string(),
            lower: 0.0,
            upper: plan.income,
            objective: -REMAINING_PENALTY,
        });
    }

    let constraints = plan
        .constraints
        .iter()
        .map(|planned| LpConstraint {
            name: planned.name.clone(),
            terms: planned
                .terms
                .iter()
                .filter_map(|(term, coefficient)| {
                    index_of.get(term).map(|index| (*index, *coefficient))
                })
                .collect(),
            op: planned.op,
            rhs: planned.rhs,
        })
        .collect();

    LpModel {
        variables,
        constraints,
    }
}

/// Index of the remainder slack, when the plan carries one.
pub(crate) fn remaining_index(plan: &ModelPlan) -> Option<usize> {
    plan.remaining.then_some(plan.bounds.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::constraints;
    use crate::optimizer::domain::BudgetRequest;
    use crate::optimizer::policy::PolicyProfile;
    use crate::optimizer::registry::CategoryRegistry;
    use crate::optimizer::utility;

    fn composed(income: f64, policy: PolicyProfile) -> (ModelPlan, LpModel) {
        let registry = CategoryRegistry::standard();
        let ratings = Category::ordered().into_iter().map(|cat| (cat, 5)).collect();
        let request = BudgetRequest::new(&registry, income, 0.0, ratings, policy)
            .expect("valid request");
        let plan = constraints::plan(&registry, &request, false);
        let weights = utility::weights(&request, false);
        let model = compose(&plan, &weights);
        (plan, model)
    }

    #[test]
    fn ceiling_model_has_one_variable_per_category() {
        let (plan, model) = composed(20_000.0, PolicyProfile::legacy());
        assert_eq!(model.variables.len(), 6);
        assert!(remaining_index(&plan).is_none());
        for spec in &model.variables {
            assert_eq!(spec.objective, 5.0);
        }
    }

    #[test]
    fn full_allocation_model_appends_penalized_slack() {
        let (plan, model) = composed(20_000.0, PolicyProfile::tiered());
        assert_eq!(model.variables.len(), 7);
        let slack_index = remaining_index(&plan).expect("slack present");
        let slack = &model.variables[slack_index];
        assert_eq!(slack.label, REMAINING_LABEL);
        assert_eq!(slack.objective, -REMAINING_PENALTY);
        assert_eq!(slack.lower, 0.0);
        assert_eq!(slack.upper, 20_000.0);
    }

    #[test]
    fn constraint_terms_map_to_variable_indices() {
        let (_plan, model) = composed(20_000.0, PolicyProfile::legacy());
        let limit = model
            .constraints
            .iter()
            .find(|c| c.name == "Budget_Limit")
            .expect("budget limit present");
        assert_eq!(limit.terms.len(), 6);
        for (index, coefficient) in &limit.terms {
            assert!(*index < model.variables.len());
            assert_eq!(*coefficient, 1.0);
        }
        // Variables follow category declaration order; Savings sits third.
        assert_eq!(model.variables[2].label, "Savings");
    }
}
