use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use budget_optimizer::error::AppError;
use budget_optimizer::export::{format_kshs, write_allocation_csv};
use budget_optimizer::optimizer::{
    BudgetMode, BudgetRequest, Category, PolicyProfile, RentBoost, UtilityMode,
};
use clap::{Args, ValueEnum};

use crate::infra::{build_optimizer, parse_rating};
use budget_optimizer::config::AppConfig;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum UtilityModeArg {
    Direct,
    NormalizedTiered,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RentBoostArg {
    None,
    FlatLow,
    FlatHigh,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BudgetModeArg {
    Ceiling,
    FullAllocation,
}

#[derive(Args, Debug)]
pub(crate) struct OptimizeArgs {
    /// Monthly income (Kshs)
    #[arg(long)]
    income: f64,
    /// Savings target (Kshs)
    #[arg(long, default_value_t = 0.0)]
    savings_target: f64,
    /// Category rating as Category=N, repeatable; unrated categories default to 5
    #[arg(long = "rating", value_parser = parse_rating)]
    ratings: Vec<(Category, u8)>,
    /// Utility scaling mode
    #[arg(long, value_enum, default_value_t = UtilityModeArg::Direct)]
    utility_mode: UtilityModeArg,
    /// Boost applied to other categories when rent is deprioritized
    #[arg(long, value_enum, default_value_t = RentBoostArg::FlatHigh)]
    rent_boost: RentBoostArg,
    /// Total-budget rule
    #[arg(long, value_enum, default_value_t = BudgetModeArg::Ceiling)]
    budget_mode: BudgetModeArg,
    /// Write the allocation as CSV to this path
    #[arg(long)]
    csv_out: Option<PathBuf>,
}

fn policy_from_args(args: &OptimizeArgs) -> PolicyProfile {
    PolicyProfile {
        utility_mode: match args.utility_mode {
            UtilityModeArg::Direct => UtilityMode::Direct,
            UtilityModeArg::NormalizedTiered => UtilityMode::NormalizedTiered,
        },
        rent_boost: match args.rent_boost {
            RentBoostArg::None => RentBoost::None,
            RentBoostArg::FlatLow => RentBoost::FlatLow,
            RentBoostArg::FlatHigh => RentBoost::FlatHigh,
        },
        budget_mode: match args.budget_mode {
            BudgetModeArg::Ceiling => BudgetMode::Ceiling,
            BudgetModeArg::FullAllocation => BudgetMode::FullAllocation,
        },
    }
}

pub(crate) fn run_optimize(args: OptimizeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let optimizer = build_optimizer(&config.solver);

    let mut ratings: BTreeMap<Category, u8> =
        Category::ordered().into_iter().map(|cat| (cat, 5)).collect();
    for (category, rating) in &args.ratings {
        ratings.insert(*category, *rating);
    }

    let policy = policy_from_args(&args);
    let request = BudgetRequest::new(
        optimizer.registry(),
        args.income,
        args.savings_target,
        ratings,
        policy,
    )
    .map_err(budget_optimizer::optimizer::OptimizeError::from)?;

    let allocation = optimizer.optimize(&request)?;

    println!(
        "Optimized budget allocation for income {}",
        format_kshs(args.income)
    );
    for (category, amount) in allocation.entries() {
        println!("  {:<14} {}", category.label(), format_kshs(amount));
    }
    if let Some(unallocated) = allocation.unallocated() {
        println!("  {:<14} {}", "Unallocated", format_kshs(unallocated));
    }
    println!(
        "  {:<14} {}",
        "Total",
        format_kshs(allocation.total_allocated())
    );

    if let Some(path) = &args.csv_out {
        let file = File::create(path)?;
        write_allocation_csv(&allocation, file)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
