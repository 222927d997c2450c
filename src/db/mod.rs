//! Database module
//!
//! This module provides user persistence including:
//! - SQLite connection pool management
//! - The `UserRepository` capability set and its SQLite and in-memory backends
//! - Database migrations
//! - The `User` model and its validation rules

pub mod manager;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod repository;

pub use manager::DatabaseManager;
pub use memory::MemoryUserRepository;
pub use models::User;
pub use repository::{SqlUserRepository, UserRepository};
