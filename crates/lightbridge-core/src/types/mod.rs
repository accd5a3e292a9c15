pub mod crypto;
pub mod header;
pub mod state;
pub mod validator;

pub use crypto::{Address, BlsPublicKey, BlsSignature, Hash};
pub use header::*;
pub use state::*;
pub use validator::*;
