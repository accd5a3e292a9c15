//! # Lightbridge Core
//!
//! Pure Rust light client verification for Tendermint-style remote chains.
//!
//! This crate contains **no networking code** and **no storage**. It decides,
//! synchronously and deterministically, whether a header submitted by a
//! relayer descends from the last trusted header of a remote chain, and if
//! so, what the next trusted state is.
//!
//! ## Trust Model
//!
//! - **Checkpoint** (`consensus::checkpoint`): the first trusted state comes
//!   from an operator, out of band. Nothing else is trusted without proof.
//!
//! - **Commit verification** (`consensus::voting_power`): every header must be
//!   signed by 2/3 of its own validator set (BLS12-381), and by at least the
//!   trust level (1/3 by default) of the last trusted validator set.
//!
//! - **Bisection** (`consensus::bisection`): when the validator set has turned
//!   over too far for a direct check, trust is bridged through intermediate
//!   headers supplied by the caller.
//!
//! - **Expiry**: a trusted state older than its trusting period is unusable,
//!   and only a new checkpoint can revive the client.
//!
//! ## Usage
//!
//! ```ignore
//! use lightbridge_core::consensus::{initialize_from_checkpoint, check_validity_and_update_state};
//! use lightbridge_core::consensus::NoIntermediateHeaders;
//! ```

pub mod client;
pub mod consensus;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod proptest;

// Re-export commonly used types for convenience
pub use client::{AnyClientState, AnyHeader, LocalhostHeader, LocalhostState};
pub use consensus::{
    bisection::{verify_bisecting, HeaderSource, NoIntermediateHeaders, Verified},
    checkpoint::{initialize_from_checkpoint, CheckpointError, TrustOptions, TrustedCheckpoint},
    light_client::{apply_header, check_validity_and_update_state, freeze},
};
pub use error::VerificationError;
pub use types::*;
