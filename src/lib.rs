pub mod config;
pub mod update;
pub mod version;
