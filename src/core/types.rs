use serde::Serialize;

pub const DEFAULT_MAX_MONTHS: u32 = 120;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoffStrategy {
    /// Smallest balance first.
    Snowball,
    /// Highest APR first.
    Avalanche,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebtAccount {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub original_balance: f64,
    pub min_payment: f64,
    /// Nominal APR in percent, e.g. `24.99`.
    pub interest_rate: f64,
}

impl DebtAccount {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: f64,
        min_payment: f64,
        interest_rate: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            balance,
            original_balance: balance,
            min_payment,
            interest_rate,
        }
    }

    pub fn with_original_balance(mut self, original_balance: f64) -> Self {
        self.original_balance = original_balance;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SimulationInputs {
    pub accounts: Vec<DebtAccount>,
    pub strategy: PayoffStrategy,
    pub monthly_extra: f64,
    pub max_months: u32,
}

impl SimulationInputs {
    pub fn new(accounts: Vec<DebtAccount>, strategy: PayoffStrategy, monthly_extra: f64) -> Self {
        Self {
            accounts,
            strategy,
            monthly_extra,
            max_months: DEFAULT_MAX_MONTHS,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MilestoneKind {
    GoalStart,
    DebtPaid,
    QuarterProgress,
    HalfProgress,
    ThreeQuarterProgress,
    DebtFree,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationMilestone {
    pub id: String,
    pub title: String,
    pub description: String,
    pub month_index: u32,
    pub amount: f64,
    pub progress_percent: f64,
    pub kind: MilestoneKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayoff {
    pub id: String,
    pub name: String,
    pub original_balance: f64,
    pub final_balance: f64,
    pub payoff_month: Option<u32>,
    pub interest_paid: f64,
    pub total_paid: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub milestones: Vec<SimulationMilestone>,
    pub total_months: u32,
    pub debt_free: bool,
    pub total_interest: f64,
    pub total_paid: f64,
    pub accounts: Vec<AccountPayoff>,
}

impl SimulationResult {
    pub fn remaining_balance(&self) -> f64 {
        self.accounts.iter().map(|a| a.final_balance.max(0.0)).sum()
    }

    pub fn first_paid(&self) -> Option<&SimulationMilestone> {
        self.milestones
            .iter()
            .find(|m| m.kind == MilestoneKind::DebtPaid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSnapshot {
    pub month: u32,
    pub target_id: Option<String>,
    pub interest_accrued: f64,
    pub minimum_paid: f64,
    pub extra_paid: f64,
    pub extra_pool: f64,
    pub total_balance: f64,
    pub progress_percent: f64,
    pub balances: Vec<f64>,
}
