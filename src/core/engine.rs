use std::collections::HashSet;

use super::error::InvalidInputError;
use super::types::{
    AccountPayoff, DebtAccount, MilestoneKind, MonthSnapshot, PayoffStrategy, SimulationInputs,
    SimulationMilestone, SimulationResult,
};

const PROGRESS_CHECK_INTERVAL: u32 = 3;

struct ProgressMark {
    threshold: f64,
    kind: MilestoneKind,
    id: &'static str,
    title: &'static str,
}

const PROGRESS_MARKS: [ProgressMark; 3] = [
    ProgressMark {
        threshold: 25.0,
        kind: MilestoneKind::QuarterProgress,
        id: "quarter",
        title: "A quarter of the way there",
    },
    ProgressMark {
        threshold: 50.0,
        kind: MilestoneKind::HalfProgress,
        id: "half",
        title: "Halfway there",
    },
    ProgressMark {
        threshold: 75.0,
        kind: MilestoneKind::ThreeQuarterProgress,
        id: "three-quarter",
        title: "Three quarters done",
    },
];

#[derive(Debug, Clone, Copy)]
struct Ledger {
    balance: f64,
    interest_accrued: f64,
    total_paid: f64,
    payoff_month: Option<u32>,
}

impl Ledger {
    fn open(account: &DebtAccount) -> Self {
        Self {
            balance: round_cents(account.balance),
            interest_accrued: 0.0,
            total_paid: 0.0,
            payoff_month: None,
        }
    }

    fn is_open(&self) -> bool {
        self.balance > 0.0
    }

    fn accrue(&mut self, annual_rate_percent: f64) -> f64 {
        let interest = round_cents(self.balance * annual_rate_percent / 100.0 / 12.0);
        self.balance = round_cents(self.balance + interest);
        self.interest_accrued = round_cents(self.interest_accrued + interest);
        interest
    }

    /// Applies up to `amount`, never past zero. Returns what was applied.
    fn pay(&mut self, amount: f64) -> f64 {
        let applied = round_cents(amount.min(self.balance).max(0.0));
        self.balance = round_cents(self.balance - applied);
        self.total_paid = round_cents(self.total_paid + applied);
        applied
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct MonthFlow {
    interest: f64,
    minimum: f64,
    extra: f64,
}

struct SimulationRun {
    result: SimulationResult,
    trace: Vec<MonthSnapshot>,
}

pub fn simulate(inputs: &SimulationInputs) -> Result<SimulationResult, InvalidInputError> {
    validate_inputs(inputs)?;
    Ok(run_simulation(inputs, false).result)
}

pub fn run_monthly_trace(inputs: &SimulationInputs) -> Result<Vec<MonthSnapshot>, InvalidInputError> {
    validate_inputs(inputs)?;
    Ok(run_simulation(inputs, true).trace)
}

/// Account indices in payoff order. Ties keep input order.
pub fn order_accounts(accounts: &[DebtAccount], strategy: PayoffStrategy) -> Vec<usize> {
    let mut order: Vec<usize> = (0..accounts.len()).collect();
    match strategy {
        PayoffStrategy::Snowball => {
            order.sort_by(|&a, &b| accounts[a].balance.total_cmp(&accounts[b].balance));
        }
        PayoffStrategy::Avalanche => {
            order.sort_by(|&a, &b| {
                accounts[b]
                    .interest_rate
                    .total_cmp(&accounts[a].interest_rate)
            });
        }
    }
    order
}

pub fn validate_inputs(inputs: &SimulationInputs) -> Result<(), InvalidInputError> {
    if !is_non_negative_amount(inputs.monthly_extra) {
        return Err(InvalidInputError::MonthlyExtra(inputs.monthly_extra));
    }

    if inputs.max_months == 0 {
        return Err(InvalidInputError::ZeroHorizon);
    }

    let mut seen = HashSet::with_capacity(inputs.accounts.len());
    for (index, account) in inputs.accounts.iter().enumerate() {
        if account.id.trim().is_empty() {
            return Err(InvalidInputError::MissingId { index });
        }
        if !seen.insert(account.id.as_str()) {
            return Err(InvalidInputError::DuplicateId(account.id.clone()));
        }

        for (field, value) in [
            ("balance", account.balance),
            ("original balance", account.original_balance),
            ("minimum payment", account.min_payment),
            ("interest rate", account.interest_rate),
        ] {
            if !is_non_negative_amount(value) {
                return Err(InvalidInputError::AccountField {
                    id: account.id.clone(),
                    field,
                    value,
                });
            }
        }
    }

    Ok(())
}

fn is_non_negative_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn run_simulation(inputs: &SimulationInputs, record_trace: bool) -> SimulationRun {
    let accounts = &inputs.accounts;
    let order = order_accounts(accounts, inputs.strategy);
    let mut ledgers: Vec<Ledger> = accounts.iter().map(Ledger::open).collect();
    let total_original: f64 = accounts.iter().map(|a| a.original_balance).sum();

    let mut milestones = vec![start_milestone(accounts.len(), total_original)];
    let mut trace = Vec::new();
    let mut extra_pool = round_cents(inputs.monthly_extra);
    let mut marks_hit = [false; PROGRESS_MARKS.len()];
    let mut month = 0;
    let mut settled = 0;

    if accounts.is_empty() {
        tracing::debug!(strategy = ?inputs.strategy, "no accounts to simulate");
        return SimulationRun {
            result: build_result(accounts, &ledgers, milestones, 0, false),
            trace,
        };
    }

    while ledgers.iter().any(Ledger::is_open) && month < inputs.max_months {
        month += 1;
        let mut flow = MonthFlow::default();
        let open_at_start: Vec<bool> = ledgers.iter().map(Ledger::is_open).collect();
        let pool_this_month = extra_pool;

        for (ledger, account) in ledgers.iter_mut().zip(accounts) {
            if !ledger.is_open() {
                continue;
            }
            flow.interest += ledger.accrue(account.interest_rate);
            flow.minimum += ledger.pay(account.min_payment);
        }

        let target = order.iter().copied().find(|&i| ledgers[i].is_open());
        if let Some(index) = target {
            flow.extra += ledgers[index].pay(pool_this_month);
        }

        for (ledger, was_open) in ledgers.iter_mut().zip(&open_at_start) {
            if *was_open && !ledger.is_open() {
                ledger.payoff_month = Some(month);
            }
        }

        // Payoffs are acknowledged in strategy order only. An account cleared
        // early by its own minimum waits until every debt ahead of it is paid.
        let progress = progress_percent(total_original, &ledgers);
        while let Some(&index) = order.get(settled) {
            if ledgers[index].is_open() {
                break;
            }
            settled += 1;
            if ledgers[index].payoff_month.is_some() {
                extra_pool = round_cents(extra_pool + accounts[index].min_payment);
                milestones.push(debt_paid_milestone(&accounts[index], month, progress));
            }
        }

        if month % PROGRESS_CHECK_INTERVAL == 0 {
            let retired = round_cents(total_original - total_balance(&ledgers));
            for (mark, hit) in PROGRESS_MARKS.iter().zip(marks_hit.iter_mut()) {
                if !*hit && progress >= mark.threshold {
                    *hit = true;
                    milestones.push(progress_milestone(mark, month, retired, progress));
                }
            }
        }

        if record_trace {
            trace.push(MonthSnapshot {
                month,
                target_id: target.map(|i| accounts[i].id.clone()),
                interest_accrued: round_cents(flow.interest),
                minimum_paid: round_cents(flow.minimum),
                extra_paid: round_cents(flow.extra),
                extra_pool: pool_this_month,
                total_balance: total_balance(&ledgers),
                progress_percent: progress,
                balances: ledgers.iter().map(|l| l.balance).collect(),
            });
        }
    }

    let progress = progress_percent(total_original, &ledgers);
    for &index in &order[settled..] {
        if !ledgers[index].is_open() && ledgers[index].payoff_month.is_some() {
            milestones.push(debt_paid_milestone(&accounts[index], month, progress));
        }
    }

    let debt_free = !ledgers.iter().any(Ledger::is_open);
    if debt_free {
        let total_paid = round_cents(ledgers.iter().map(|l| l.total_paid).sum());
        milestones.push(debt_free_milestone(month, total_paid));
    }

    tracing::debug!(
        strategy = ?inputs.strategy,
        accounts = accounts.len(),
        total_months = month,
        debt_free,
        "simulation finished"
    );

    SimulationRun {
        result: build_result(accounts, &ledgers, milestones, month, debt_free),
        trace,
    }
}

fn build_result(
    accounts: &[DebtAccount],
    ledgers: &[Ledger],
    milestones: Vec<SimulationMilestone>,
    total_months: u32,
    debt_free: bool,
) -> SimulationResult {
    let payoffs: Vec<AccountPayoff> = accounts
        .iter()
        .zip(ledgers)
        .map(|(account, ledger)| AccountPayoff {
            id: account.id.clone(),
            name: account.name.clone(),
            original_balance: account.original_balance,
            final_balance: ledger.balance,
            payoff_month: ledger.payoff_month,
            interest_paid: ledger.interest_accrued,
            total_paid: ledger.total_paid,
        })
        .collect();

    SimulationResult {
        milestones,
        total_months,
        debt_free,
        total_interest: round_cents(payoffs.iter().map(|p| p.interest_paid).sum()),
        total_paid: round_cents(payoffs.iter().map(|p| p.total_paid).sum()),
        accounts: payoffs,
    }
}

fn total_balance(ledgers: &[Ledger]) -> f64 {
    round_cents(ledgers.iter().map(|l| l.balance.max(0.0)).sum())
}

fn progress_percent(total_original: f64, ledgers: &[Ledger]) -> f64 {
    if total_original <= 0.0 {
        return if ledgers.iter().any(Ledger::is_open) {
            0.0
        } else {
            100.0
        };
    }
    let retired = total_original - total_balance(ledgers);
    (retired / total_original * 100.0).clamp(0.0, 100.0)
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn start_milestone(account_count: usize, total_original: f64) -> SimulationMilestone {
    SimulationMilestone {
        id: "start".to_string(),
        title: "Journey begins".to_string(),
        description: format!("{account_count} debts totalling {total_original:.2} to pay off"),
        month_index: 0,
        amount: round_cents(total_original),
        progress_percent: 0.0,
        kind: MilestoneKind::GoalStart,
        account_id: None,
    }
}

fn debt_paid_milestone(account: &DebtAccount, month: u32, progress: f64) -> SimulationMilestone {
    SimulationMilestone {
        id: format!("paid-{}", account.id),
        title: format!("{} paid off", account.name),
        description: format!(
            "{} is cleared; its {:.2} minimum now rolls into the next debt",
            account.name, account.min_payment
        ),
        month_index: month,
        amount: account.original_balance,
        progress_percent: progress,
        kind: MilestoneKind::DebtPaid,
        account_id: Some(account.id.clone()),
    }
}

fn progress_milestone(
    mark: &ProgressMark,
    month: u32,
    retired: f64,
    progress: f64,
) -> SimulationMilestone {
    SimulationMilestone {
        id: mark.id.to_string(),
        title: mark.title.to_string(),
        description: format!("{retired:.2} of principal retired ({progress:.1}% complete)"),
        month_index: month,
        amount: retired,
        progress_percent: progress,
        kind: mark.kind,
        account_id: None,
    }
}

fn debt_free_milestone(month: u32, total_paid: f64) -> SimulationMilestone {
    SimulationMilestone {
        id: "debt-free".to_string(),
        title: "Debt free".to_string(),
        description: format!("Every debt cleared after {month} months, {total_paid:.2} paid in total"),
        month_index: month,
        amount: total_paid,
        progress_percent: 100.0,
        kind: MilestoneKind::DebtFree,
        account_id: None,
    }
}
