pub mod contract;
pub mod verifier;
pub mod wallet;

pub use contract::*;
pub use verifier::*;
pub use wallet::*;
