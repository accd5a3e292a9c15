pub mod bisection;
pub mod checkpoint;
pub mod light_client;
pub mod validity;
pub mod voting_power;

pub use bisection::*;
pub use checkpoint::*;
pub use light_client::*;
pub use validity::*;
pub use voting_power::*;
