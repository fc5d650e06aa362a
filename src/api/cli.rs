use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

use super::{ApiError, build_request, run_http_server, run_simulate};
use crate::core::{DEFAULT_MAX_MONTHS, PayoffStrategy, compare_strategies, solve_monthly_extra};

const DEFAULT_MONTHLY_EXTRA: f64 = 200.0;
const DEFAULT_DEMO_COUNT: usize = 5;
const DEFAULT_TARGET_MONTHS: u32 = 36;
const DEFAULT_SEARCH_MAX: f64 = 10_000.0;
const DEFAULT_TOLERANCE: f64 = 0.01;
const DEFAULT_SOLVER_ITERATIONS: u32 = 40;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    Snowball,
    Avalanche,
}

impl From<CliStrategy> for PayoffStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Snowball => PayoffStrategy::Snowball,
            CliStrategy::Avalanche => PayoffStrategy::Avalanche,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "payoff",
    about = "Debt payoff planner (snowball / avalanche amortization with milestones)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Simulate one strategy and print the milestone timeline.
    Simulate(PlanArgs),
    /// Run snowball and avalanche side by side.
    Compare(PlanArgs),
    /// Find the smallest monthly extra that clears all debt by a target month.
    Solve {
        #[command(flatten)]
        plan: PlanArgs,
        #[command(flatten)]
        goal: GoalArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[arg(
        long,
        help = "JSON file holding an array of {id, name, balance, minPayment, interestRate}"
    )]
    pub accounts: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = CliStrategy::Snowball)]
    pub strategy: CliStrategy,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTHLY_EXTRA,
        help = "Payment on top of all minimums, aimed at the current target debt"
    )]
    pub monthly_extra: f64,
    #[arg(long, default_value_t = DEFAULT_MAX_MONTHS, help = "Simulation horizon in months")]
    pub max_months: u32,
    #[arg(long, help = "Generate a deterministic demo portfolio from this seed")]
    pub demo_seed: Option<u64>,
    #[arg(
        long,
        conflicts_with = "demo_seed",
        help = "Generate a deterministic demo portfolio named by this text"
    )]
    pub demo_name: Option<String>,
    #[arg(long, default_value_t = DEFAULT_DEMO_COUNT)]
    pub demo_count: usize,
    #[arg(
        long,
        help = "First month of the plan as YYYY-MM; defaults to the current month"
    )]
    pub start_month: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GoalArgs {
    #[arg(long, default_value_t = DEFAULT_TARGET_MONTHS)]
    pub target_months: u32,
    #[arg(long, default_value_t = DEFAULT_SEARCH_MAX)]
    pub search_max: f64,
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,
    #[arg(long, default_value_t = DEFAULT_SOLVER_ITERATIONS)]
    pub max_iterations: u32,
}

pub(crate) fn default_plan_args() -> PlanArgs {
    PlanArgs {
        accounts: None,
        strategy: CliStrategy::Snowball,
        monthly_extra: DEFAULT_MONTHLY_EXTRA,
        max_months: DEFAULT_MAX_MONTHS,
        demo_seed: None,
        demo_name: None,
        demo_count: DEFAULT_DEMO_COUNT,
        start_month: None,
    }
}

pub(crate) fn default_goal_args() -> GoalArgs {
    GoalArgs {
        target_months: DEFAULT_TARGET_MONTHS,
        search_max: DEFAULT_SEARCH_MAX,
        tolerance: DEFAULT_TOLERANCE,
        max_iterations: DEFAULT_SOLVER_ITERATIONS,
    }
}

/// Runs a subcommand. One-shot commands print their result as JSON on stdout.
pub async fn run(command: Command) -> Result<(), ApiError> {
    match command {
        Command::Serve { port } => Ok(run_http_server(port).await?),
        Command::Simulate(plan) => {
            let request = build_request(plan, default_goal_args(), None)?;
            print_json(&run_simulate(&request)?)
        }
        Command::Compare(plan) => {
            let request = build_request(plan, default_goal_args(), None)?;
            let inputs = &request.inputs;
            let comparison =
                compare_strategies(&inputs.accounts, inputs.monthly_extra, inputs.max_months)?;
            print_json(&comparison)
        }
        Command::Solve { plan, goal } => {
            let request = build_request(plan, goal, None)?;
            let solved = solve_monthly_extra(
                &request.inputs.accounts,
                request.inputs.strategy,
                request.goal,
            )?;
            print_json(&solved)
        }
    }
}

fn print_json<T: Serialize>(body: &T) -> Result<(), ApiError> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}
