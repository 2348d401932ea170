//! Chatdesk server library
//!
//! Plan entitlements, platform data access and the authenticated API
//! endpoints backing the dashboard.

pub mod clients;
pub mod config;
pub mod db;
pub mod entitlements;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

pub use config::AppSettings;
pub use error::{AppError, AppResult};
