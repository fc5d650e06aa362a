use super::rng::{SplitMix64, hash_unit};
use super::types::DebtAccount;

pub const MAX_DEMO_ACCOUNTS: usize = 12;

const DEMO_SEED_SCALE: f64 = (1_u64 << 53) as f64;

struct DemoKind {
    label: &'static str,
    balance: (f64, f64),
    rate: (f64, f64),
    /// Minimum payment as a share of balance.
    min_share: (f64, f64),
}

const DEMO_KINDS: [DemoKind; 6] = [
    DemoKind {
        label: "Credit card",
        balance: (800.0, 9_000.0),
        rate: (17.0, 29.99),
        min_share: (0.02, 0.04),
    },
    DemoKind {
        label: "Store card",
        balance: (200.0, 2_500.0),
        rate: (19.0, 31.0),
        min_share: (0.03, 0.05),
    },
    DemoKind {
        label: "Personal loan",
        balance: (2_000.0, 15_000.0),
        rate: (7.0, 16.0),
        min_share: (0.025, 0.035),
    },
    DemoKind {
        label: "Car loan",
        balance: (5_000.0, 25_000.0),
        rate: (3.5, 9.0),
        min_share: (0.018, 0.025),
    },
    DemoKind {
        label: "Student loan",
        balance: (8_000.0, 40_000.0),
        rate: (3.0, 7.5),
        min_share: (0.008, 0.012),
    },
    DemoKind {
        label: "Medical bill",
        balance: (150.0, 3_000.0),
        rate: (0.0, 0.0),
        min_share: (0.04, 0.08),
    },
];

/// Hands out `demo-1`, `demo-2`, … for one generation run.
#[derive(Debug, Default)]
pub struct IdCounter {
    next: u32,
}

impl IdCounter {
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}-{}", self.next)
    }
}

/// Portfolio used when a caller supplies no accounts.
pub fn default_accounts() -> Vec<DebtAccount> {
    vec![
        DebtAccount::new("credit-card", "Credit Card", 4_500.0, 135.0, 24.99),
        DebtAccount::new("store-card", "Store Card", 850.0, 35.0, 26.9),
        DebtAccount::new("car-loan", "Car Loan", 12_000.0, 320.0, 6.9),
        DebtAccount::new("student-loan", "Student Loan", 18_500.0, 210.0, 4.5),
        DebtAccount::new("medical", "Medical Bill", 1_200.0, 60.0, 0.0),
    ]
}

pub fn demo_accounts(seed: u64, count: usize) -> Vec<DebtAccount> {
    let mut rng = SplitMix64::new(seed);
    let mut ids = IdCounter::default();
    (0..count.min(MAX_DEMO_ACCOUNTS))
        .filter_map(|_| {
            let kind = rng.pick(&DEMO_KINDS)?;
            Some(demo_account(&mut rng, &mut ids, kind))
        })
        .collect()
}

/// Seed for a named demo portfolio, so `"household"` always yields the same debts.
pub fn demo_seed_for(name: &str) -> u64 {
    (hash_unit(name.trim()) * DEMO_SEED_SCALE) as u64
}

fn demo_account(rng: &mut SplitMix64, ids: &mut IdCounter, kind: &DemoKind) -> DebtAccount {
    let balance = round_to(rng.range(kind.balance.0, kind.balance.1), 10.0);
    let rate = (rng.range(kind.rate.0, kind.rate.1) * 100.0).round() / 100.0;
    let min_payment = round_to(balance * rng.range(kind.min_share.0, kind.min_share.1), 1.0).max(15.0);
    let id = ids.next_id("demo");
    let name = format!("{} {}", kind.label, &id["demo-".len()..]);
    DebtAccount::new(id, name, balance, min_payment, rate)
}

fn round_to(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}
