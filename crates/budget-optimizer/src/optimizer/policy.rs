use serde::{Deserialize, Serialize};

/// How a raw 1-10 rating becomes a utility weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityMode {
    /// Weight equals the rating unchanged.
    Direct,
    /// Rating mapped onto 0.5..=1.5 then scaled by an income tier factor.
    NormalizedTiered,
}

/// Additive boost applied to every non-rent category when the rent
/// deprioritization triggers, redistributing the freed utility mass.
///
/// The observed profiles disagreed on the magnitude, so it is policy data
/// rather than a hardcoded constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentBoost {
    None,
    /// +0.1, paired with normalized weights.
    FlatLow,
    /// +2.0, paired with direct weights.
    FlatHigh,
    Custom { boost: f64 },
}

impl RentBoost {
    pub fn magnitude(&self) -> f64 {
        match self {
            RentBoost::None => 0.0,
            RentBoost::FlatLow => 0.1,
            RentBoost::FlatHigh => 2.0,
            RentBoost::Custom { boost } => *boost,
        }
    }
}

/// Shape of the total-budget rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetMode {
    /// Total spending may fall below income with no explicit remainder.
    Ceiling,
    /// Total spending plus an explicit non-negative remainder equals income.
    FullAllocation,
}

/// The family of related optimization profiles, captured as data instead of
/// divergent code paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyProfile {
    pub utility_mode: UtilityMode,
    pub rent_boost: RentBoost,
    pub budget_mode: BudgetMode,
}

impl PolicyProfile {
    /// The simple legacy profile: direct weights, high flat boost, ceiling.
    pub fn legacy() -> Self {
        Self {
            utility_mode: UtilityMode::Direct,
            rent_boost: RentBoost::FlatHigh,
            budget_mode: BudgetMode::Ceiling,
        }
    }

    /// Income-tiered profile with an explicit unspent remainder.
    pub fn tiered() -> Self {
        Self {
            utility_mode: UtilityMode::NormalizedTiered,
            rent_boost: RentBoost::FlatLow,
            budget_mode: BudgetMode::FullAllocation,
        }
    }
}

impl Default for PolicyProfile {
    fn default() -> Self {
        Self::legacy()
    }
}
