pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod server;
pub mod types;

pub use error::{FightError, Result, ScraperError};
pub use parser::FightParser;
pub use types::FightRecord;
