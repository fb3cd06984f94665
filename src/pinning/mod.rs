pub mod local;
pub mod pinata;
pub mod pinner;

pub use local::*;
pub use pinata::*;
pub use pinner::*;
