//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.
//! Choice fields are stored as their text value and parsed on the way out.

pub mod credit_holding;
pub mod credit_wallet;
pub mod evidence;
pub mod evidence_comment;
pub mod evidence_revision;
pub mod project;
pub mod project_document;
pub mod project_image;
pub mod transaction;
pub mod user;

use std::str::FromStr;

/// Parse a stored choice value, falling back when the row holds something unknown.
pub(crate) fn choice<T: FromStr>(column: &'static str, value: &str, fallback: T) -> T {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!(column, value, "Unknown choice value in database row");
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProjectStatus, UserRole};

    #[test]
    fn test_choice_parses_known_values() {
        assert_eq!(choice("role", "verifier", UserRole::default()), UserRole::Verifier);
        assert_eq!(
            choice("status", "under_review", ProjectStatus::Draft),
            ProjectStatus::UnderReview
        );
    }

    #[test]
    fn test_choice_falls_back_on_unknown() {
        assert_eq!(choice("role", "superuser", UserRole::default()), UserRole::ProjectDeveloper);
    }
}
