pub mod aggregate;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod ingest;
pub mod page;
pub mod server;
pub mod table;
pub mod window;

/// Application name for XDG paths
pub const APP_NAME: &str = "moodplot";
