pub mod category;
pub mod config;
pub mod error;
pub mod report;
pub mod session;
pub mod usage;
