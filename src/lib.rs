pub mod cli;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod import;
pub mod middleware;
pub mod router;
pub mod services;
pub mod types;
pub mod yahrzeit;
