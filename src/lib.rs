pub mod config;
pub mod credential;
pub mod error;
pub mod identity;
pub mod server;
pub mod store;
