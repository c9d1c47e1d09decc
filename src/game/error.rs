use thiserror::Error;

/// Errors surfaced by the duel engine
///
/// Running out of free cells for food or obstacles is not an error: the arena
/// logs it and skips that placement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DuelError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("illegal bet: {0}")]
    IllegalBet(String),
}
