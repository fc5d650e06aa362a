use serde::Serialize;

use super::engine::{round_cents, simulate};
use super::error::InvalidInputError;
use super::types::{DebtAccount, PayoffStrategy, SimulationInputs, SimulationResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySummary {
    pub strategy: PayoffStrategy,
    pub total_months: u32,
    pub debt_free: bool,
    pub total_interest: f64,
    pub total_paid: f64,
    pub remaining_balance: f64,
    pub first_paid_id: Option<String>,
}

impl StrategySummary {
    fn from_result(strategy: PayoffStrategy, result: &SimulationResult) -> Self {
        Self {
            strategy,
            total_months: result.total_months,
            debt_free: result.debt_free,
            total_interest: result.total_interest,
            total_paid: result.total_paid,
            remaining_balance: result.remaining_balance(),
            first_paid_id: result.first_paid().and_then(|m| m.account_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub snowball: StrategySummary,
    pub avalanche: StrategySummary,
    pub recommended: PayoffStrategy,
    /// Interest the recommended strategy avoids relative to the other one.
    pub interest_saved: f64,
    pub months_saved: i64,
}

pub fn compare_strategies(
    accounts: &[DebtAccount],
    monthly_extra: f64,
    max_months: u32,
) -> Result<StrategyComparison, InvalidInputError> {
    let run = |strategy| -> Result<StrategySummary, InvalidInputError> {
        let inputs = SimulationInputs {
            accounts: accounts.to_vec(),
            strategy,
            monthly_extra,
            max_months,
        };
        let result = simulate(&inputs)?;
        Ok(StrategySummary::from_result(strategy, &result))
    };

    let snowball = run(PayoffStrategy::Snowball)?;
    let avalanche = run(PayoffStrategy::Avalanche)?;

    let recommended = pick_recommended(&snowball, &avalanche);
    let (best, other) = match recommended {
        PayoffStrategy::Snowball => (&snowball, &avalanche),
        PayoffStrategy::Avalanche => (&avalanche, &snowball),
    };
    let interest_saved = round_cents(other.total_interest - best.total_interest);
    let months_saved = i64::from(other.total_months) - i64::from(best.total_months);

    tracing::debug!(
        ?recommended,
        interest_saved,
        months_saved,
        "compared payoff strategies"
    );

    Ok(StrategyComparison {
        snowball,
        avalanche,
        recommended,
        interest_saved,
        months_saved,
    })
}

fn pick_recommended(snowball: &StrategySummary, avalanche: &StrategySummary) -> PayoffStrategy {
    match (snowball.debt_free, avalanche.debt_free) {
        (true, false) => PayoffStrategy::Snowball,
        (false, true) => PayoffStrategy::Avalanche,
        (false, false) => {
            if avalanche.remaining_balance < snowball.remaining_balance {
                PayoffStrategy::Avalanche
            } else {
                PayoffStrategy::Snowball
            }
        }
        (true, true) => {
            let by_interest = avalanche.total_interest.total_cmp(&snowball.total_interest);
            let by_months = avalanche.total_months.cmp(&snowball.total_months);
            if by_interest.then(by_months).is_lt() {
                PayoffStrategy::Avalanche
            } else {
                PayoffStrategy::Snowball
            }
        }
    }
}
