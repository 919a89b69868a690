pub mod config;
pub mod conversation;
pub mod error;

pub use config::Config;
pub use conversation::*;
pub use error::*;
