pub mod file;
pub mod record;
pub mod usage;
pub mod verify;
