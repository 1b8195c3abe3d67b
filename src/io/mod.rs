pub mod config;
pub mod reporting;
