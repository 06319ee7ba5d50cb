pub mod config_logger;
pub mod logger;
pub mod time;
