//! CLI command implementations.

pub mod config;
pub mod decode;
pub mod keygen;
pub mod speed;

// Re-export command handlers
pub use config::config;
pub use decode::decode;
pub use keygen::keygen;
pub use speed::{speed, SpeedParams};
