pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod server;
pub mod services;
pub mod types;
