//! HTTP request handlers.

pub mod account_handler;
pub mod admin_handler;
pub mod auth_handler;
pub mod evidence_handler;
pub mod project_handler;
pub mod transaction_handler;
pub mod wallet_handler;

pub use account_handler::account_routes;
pub use admin_handler::admin_routes;
pub use auth_handler::auth_routes;
pub use evidence_handler::evidence_routes;
pub use project_handler::project_routes;
pub use transaction_handler::transaction_routes;
pub use wallet_handler::{wallet_admin_routes, wallet_routes};
