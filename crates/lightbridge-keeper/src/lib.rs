//! # Lightbridge Keeper
//!
//! The store boundary around `lightbridge-core`. The core decides whether a
//! header is valid; this crate owns where client states live and makes sure
//! two updates of the same chain can never both commit against the same
//! trusted state.
//!
//! - [`store`]: the [`ClientStore`] trait with revisioned compare-and-swap,
//!   plus an in-memory implementation.
//! - [`header_cache`]: relayer-submitted headers, served to the core as
//!   bisection intermediates.
//! - [`keeper`]: [`ClientKeeper`], the create/update/freeze entry points.
//!
//! Build an in-memory keeper with [`ClientKeeper::in_memory`], or pass
//! [`InMemoryStore::from_config`] to [`ClientKeeper::new`], so the store and
//! the keeper share one [`KeeperConfig`].

pub mod config;
pub mod error;
pub mod header_cache;
pub mod keeper;
pub mod store;

pub use config::KeeperConfig;
pub use error::{KeeperError, Result};
pub use header_cache::{ChainHeaders, HeaderCache};
pub use keeper::{ClientKeeper, UpdateStats};
pub use store::{ClientStore, InMemoryStore, Versioned};
