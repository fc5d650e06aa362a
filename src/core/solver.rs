use serde::Serialize;

use super::engine::{simulate, validate_inputs};
use super::error::InvalidInputError;
use super::types::{DebtAccount, PayoffStrategy, SimulationInputs};

#[derive(Debug, Clone, Copy)]
pub struct ExtraSolveConfig {
    pub target_months: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl ExtraSolveConfig {
    pub fn for_target(target_months: u32, search_max: f64) -> Self {
        Self {
            target_months,
            search_min: 0.0,
            search_max,
            tolerance: 0.01,
            max_iterations: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub total_months: u32,
    pub debt_free: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraSolveResult {
    pub strategy: PayoffStrategy,
    pub target_months: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    /// Smallest monthly extra found that clears everything within `target_months`.
    pub solved_value: Option<f64>,
    pub achieved_months: Option<u32>,
    pub achieved_interest: Option<f64>,
    pub iterations: Vec<ExtraSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    total_months: u32,
    debt_free: bool,
    total_interest: f64,
}

pub fn solve_monthly_extra(
    accounts: &[DebtAccount],
    strategy: PayoffStrategy,
    config: ExtraSolveConfig,
) -> Result<ExtraSolveResult, InvalidInputError> {
    validate_config(config)?;

    let base = SimulationInputs {
        accounts: accounts.to_vec(),
        strategy,
        monthly_extra: config.search_min,
        max_months: config.target_months,
    };
    validate_inputs(&base)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_eval = evaluate_candidate(&base, config.search_min)?;
    let high_eval = evaluate_candidate(&base, config.search_max)?;

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    if base.accounts.is_empty() {
        solved_value = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "No debts to pay off; the lower bound suffices.".to_string();
    } else if low_eval.debt_free {
        solved_value = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already debt free within the target at the lower bound.".to_string();
    } else if !high_eval.debt_free {
        feasible = false;
        message = "No extra payment within the search bounds clears the debt in time.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let eval = evaluate_candidate(&base, mid)?;
            iterations.push(ExtraSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                total_months: eval.total_months,
                debt_free: eval.debt_free,
            });

            if eval.debt_free {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(hi);
        feasible = true;
        message = if converged {
            "Solved required monthly extra payment.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let mut achieved_months = None;
    let mut achieved_interest = None;
    if let Some(value) = solved_value {
        let final_eval = evaluate_candidate(&base, value)?;
        achieved_months = Some(final_eval.total_months);
        achieved_interest = Some(final_eval.total_interest);
    }

    tracing::debug!(
        ?strategy,
        target_months = config.target_months,
        ?solved_value,
        feasible,
        iterations = iterations.len(),
        "solved monthly extra"
    );

    Ok(ExtraSolveResult {
        strategy,
        target_months: config.target_months,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        achieved_months,
        achieved_interest,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn evaluate_candidate(
    base: &SimulationInputs,
    candidate_value: f64,
) -> Result<CandidateEval, InvalidInputError> {
    let inputs = SimulationInputs {
        monthly_extra: candidate_value.max(0.0),
        ..base.clone()
    };
    let result = simulate(&inputs)?;
    Ok(CandidateEval {
        total_months: result.total_months,
        debt_free: result.debt_free,
        total_interest: result.total_interest,
    })
}

fn validate_config(config: ExtraSolveConfig) -> Result<(), InvalidInputError> {
    if config.target_months == 0 {
        return Err(InvalidInputError::SolverConfig("target months must be > 0"));
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(InvalidInputError::SolverConfig("search bounds must be finite"));
    }
    if config.search_min < 0.0 {
        return Err(InvalidInputError::SolverConfig("search min must be >= 0"));
    }
    if config.search_max <= config.search_min {
        return Err(InvalidInputError::SolverConfig(
            "search max must be greater than search min",
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(InvalidInputError::SolverConfig("tolerance must be > 0"));
    }
    if config.max_iterations == 0 {
        return Err(InvalidInputError::SolverConfig("max iterations must be > 0"));
    }
    Ok(())
}
