pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, CommonArgs};

pub use crate::app::demos::{build_engine, LessonKind};
pub use crate::config::PrimerConfig;
pub use crate::core::engine::DemoEngine;
pub use crate::utils::error::{PrimerError, Result};
pub use crate::utils::narration::Narrator;
