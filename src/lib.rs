//! Libris Library Lending System
//!
//! A Rust server for a library lending workflow: a book catalog, user
//! accounts with roles, and the borrow/return lifecycle with lazily
//! accrued overdue penalties.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
