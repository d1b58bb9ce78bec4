pub mod config;
pub mod logs;
pub mod request;
pub mod serve;

pub use config::ConfigCommand;
pub use logs::LogsCommand;
