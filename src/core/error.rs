#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("cash balance became non-finite on path {path} at period {period}; inputs too large")]
    NonFiniteBalance { path: usize, period: usize },
}
