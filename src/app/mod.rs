pub mod demos;

#[cfg(feature = "cli")]
pub mod runner;
