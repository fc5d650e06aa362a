mod compare;
mod demo;
mod engine;
mod error;
mod rng;
mod solver;
mod types;

pub use compare::{StrategyComparison, StrategySummary, compare_strategies};
pub use demo::{IdCounter, MAX_DEMO_ACCOUNTS, default_accounts, demo_accounts, demo_seed_for};
pub use engine::{order_accounts, run_monthly_trace, simulate, validate_inputs};
pub use error::InvalidInputError;
pub use rng::{SplitMix64, hash_unit, splitmix64};
pub use solver::{ExtraSolveConfig, ExtraSolveIteration, ExtraSolveResult, solve_monthly_extra};
pub use types::{
    AccountPayoff, DEFAULT_MAX_MONTHS, DebtAccount, MilestoneKind, MonthSnapshot, PayoffStrategy,
    SimulationInputs, SimulationMilestone, SimulationResult,
};
