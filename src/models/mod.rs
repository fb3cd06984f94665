pub mod profile;
pub mod record;

pub use profile::*;
pub use record::*;
