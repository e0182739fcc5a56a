pub mod config;
pub mod dispatch;
