use thiserror::Error;

/// Rejected simulation input. Raised before any month is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("monthly extra payment must be a finite amount >= 0 (got {0})")]
    MonthlyExtra(f64),
    #[error("max months must be > 0")]
    ZeroHorizon,
    #[error("account #{index} is missing an id")]
    MissingId { index: usize },
    #[error("account id '{0}' appears more than once")]
    DuplicateId(String),
    #[error("account '{id}': {field} must be a finite amount >= 0 (got {value})")]
    AccountField {
        id: String,
        field: &'static str,
        value: f64,
    },
    #[error("solver config: {0}")]
    SolverConfig(&'static str),
}
