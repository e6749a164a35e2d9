pub mod config;
pub mod error;
pub mod topics;
pub mod types;

pub use config::Config;
pub use error::PressWatchError;
pub use topics::*;
pub use types::*;
