//! Error taxonomy shared by every engine operation.
//!
//! None of these are transient: each is a deterministic consequence of the
//! caller's input, and every check runs before any state is touched.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Match,
    Player,
    Auction,
    Bid,
    Contract,
    Brand,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Match => "match",
            EntityKind::Player => "player",
            EntityKind::Auction => "auction",
            EntityKind::Bid => "bid",
            EntityKind::Contract => "contract",
            EntityKind::Brand => "brand",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("permission violation: {0}")]
    PermissionViolation(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        EngineError::NotFound { kind, id: id.into() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
