pub mod bridge;
pub mod error;
pub mod payload;

pub use bridge::{HostBridge, OsascriptBridge};
pub use error::HostError;
pub use payload::ERROR_SENTINEL;
