//! Application configuration and the persisted sign-in session

pub mod app_config;
pub mod session_file;
