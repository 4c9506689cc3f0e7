pub mod api_connection;
pub mod cli;
pub mod config;
pub mod error;
pub mod local_cache;
pub mod message_exchange;
pub mod models;
pub mod session_manager;
