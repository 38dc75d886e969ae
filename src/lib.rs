pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod scope;
pub mod services;
pub mod slug;
pub mod storage;
pub mod types;
