pub mod error;
pub mod logger;
pub mod monitor;
pub mod narration;
pub mod validation;
