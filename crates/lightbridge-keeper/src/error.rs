use lightbridge_core::{ChainId, VerificationError};
use thiserror::Error;

/// Errors at the client store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeeperError {
    #[error("No client tracks chain {chain_id}")]
    ClientNotFound { chain_id: ChainId },

    #[error("A client for chain {chain_id} already exists")]
    ClientAlreadyExists { chain_id: ChainId },

    #[error("Client for chain {chain_id} was modified concurrently: expected revision {expected}, found {actual}")]
    RevisionConflict {
        chain_id: ChainId,
        expected: u64,
        actual: u64,
    },

    #[error("Update of chain {chain_id} still conflicted after {attempts} attempts")]
    UpdateConflict { chain_id: ChainId, attempts: u32 },

    #[error("Header rejected: {0}")]
    Verification(#[from] VerificationError),

    #[error("Invalid keeper config: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, KeeperError>;
