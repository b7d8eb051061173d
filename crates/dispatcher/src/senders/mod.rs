//! Sender implementations
//!
//! Contains HttpSender and LogSender.

mod http;
mod log;

pub use self::http::HttpSender;
pub use self::log::LogSender;
