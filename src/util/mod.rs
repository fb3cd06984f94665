pub mod hash;
pub mod pdf;
