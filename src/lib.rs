//! Carbon Market - a marketplace API for carbon credits.
//!
//! Project proponents register carbon projects and submit verification
//! evidence, verifiers review it, issued credits are traded between
//! accounts and land in per-account wallets where they can be retired.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Core business entities and rules
//! - **services**: Use cases and authorization
//! - **infra**: Database, repositories and media storage
//! - **admin**: Table listing configuration for administrators
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared types (pagination, responses)
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod admin;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

pub use api::{create_router, AppState};
pub use config::Config;
pub use domain::{CreditWallet, Evidence, Project, Transaction, User, UserRole};
pub use errors::{AppError, AppResult};
