pub mod certificate;
pub mod mint;
pub mod record;
pub mod usage;
pub mod verify;

pub use certificate::CertificateService;
pub use mint::MintService;
pub use record::RecordService;
pub use usage::UsageService;
pub use verify::VerifyService;
