// Pending Core - Domain Logic & Ports
// NO infrastructure dependencies: storage backends live in their own crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
