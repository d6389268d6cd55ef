pub mod api;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod guard;
pub mod models;
pub mod session;
