//! Account domain entity and related types.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::choices::choice_enum;
use crate::config::{MAX_MOBILE_LENGTH, MOBILE_PATTERN};
use crate::errors::{AppError, AppResult};

/// Compiled mobile number pattern, shared with request validation.
pub static MOBILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(MOBILE_PATTERN).expect("mobile pattern is valid"));

choice_enum! {
    /// Account roles
    UserRole("role") {
        ProjectDeveloper => ("project_developer", "Project Developer"),
        CreditBuyer => ("credit_buyer", "Credit Buyer"),
        Verifier => ("verifier", "Verifier"),
        Administrator => ("administrator", "Administrator"),
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::ProjectDeveloper
    }
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Administrator)
    }

    /// Verifiers and administrators review projects and evidence
    pub fn can_review(&self) -> bool {
        matches!(self, UserRole::Verifier | UserRole::Administrator)
    }

    /// Roles a user may pick for themselves at registration
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, UserRole::ProjectDeveloper | UserRole::CreditBuyer)
    }
}

/// Validate a mobile number against the accepted pattern.
pub fn validate_mobile(mobile: &str) -> AppResult<()> {
    if mobile.len() > MAX_MOBILE_LENGTH as usize || !MOBILE_REGEX.is_match(mobile) {
        return Err(AppError::validation(
            "Mobile number must be 9 to 15 digits, optionally prefixed with '+'",
        ));
    }
    Ok(())
}

/// Marketplace account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub mobile: Option<String>,
    pub kyb_link: Option<String>,
    pub is_project_proponent: bool,
    pub has_completed_kyc: bool,
    /// External authentication identifier
    pub firebase_uid: Option<String>,
    /// Accounts are deactivated, never deleted
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new account with default role and flags
    pub fn new(id: Uuid, username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            role: UserRole::default(),
            mobile: None,
            kyb_link: None,
            is_project_proponent: false,
            has_completed_kyc: false,
            firebase_uid: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn can_review(&self) -> bool {
        self.role.can_review()
    }

    /// "First Last", falling back to the username
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Display form used in listings, e.g. `alice (Verifier)`
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.username, self.role.label())
    }

    /// Apply a profile change set. Role changes are checked by the caller.
    pub fn apply(&mut self, update: ProfileUpdate) -> AppResult<()> {
        if let Some(mobile) = &update.mobile {
            if !mobile.is_empty() {
                validate_mobile(mobile)?;
            }
        }

        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(mobile) = update.mobile {
            self.mobile = non_empty(mobile);
        }
        if let Some(kyb_link) = update.kyb_link {
            self.kyb_link = non_empty(kyb_link);
        }
        if let Some(firebase_uid) = update.firebase_uid {
            self.firebase_uid = non_empty(firebase_uid);
        }
        if let Some(flag) = update.is_project_proponent {
            self.is_project_proponent = flag;
        }
        if let Some(flag) = update.has_completed_kyc {
            self.has_completed_kyc = flag;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }
}

/// Empty strings clear optional profile fields
fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Data required to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub mobile: Option<String>,
    pub kyb_link: Option<String>,
    pub firebase_uid: Option<String>,
}

/// Profile change set. `Some("")` clears an optional text field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
    pub kyb_link: Option<String>,
    pub firebase_uid: Option<String>,
    pub is_project_proponent: Option<bool>,
    pub has_completed_kyc: Option<bool>,
    pub role: Option<UserRole>,
}

impl ProfileUpdate {
    /// Fields only administrators may change
    pub fn touches_privileged_fields(&self) -> bool {
        self.role.is_some() || self.has_completed_kyc.is_some()
    }
}

/// Account response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "greenfields")]
    pub username: String,
    #[schema(example = "dev@example.com")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    #[schema(example = "Project Developer")]
    pub role_display: String,
    pub mobile: Option<String>,
    pub kyb_link: Option<String>,
    pub is_project_proponent: bool,
    pub has_completed_kyc: bool,
    pub firebase_uid: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role_display: user.role.label().to_string(),
            role: user.role,
            mobile: user.mobile,
            kyb_link: user.kyb_link,
            is_project_proponent: user.is_project_proponent,
            has_completed_kyc: user.has_completed_kyc,
            firebase_uid: user.firebase_uid,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> User {
        User::new(
            Uuid::new_v4(),
            "greenfields".into(),
            "dev@example.com".into(),
            "hash".into(),
        )
    }

    #[test]
    fn test_new_account_defaults() {
        let user = account();
        assert_eq!(user.role, UserRole::ProjectDeveloper);
        assert!(user.is_active);
        assert!(!user.is_project_proponent);
        assert!(!user.has_completed_kyc);
        assert!(user.firebase_uid.is_none());
    }

    #[test]
    fn test_role_round_trip_and_labels() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), *role);
        }
        assert_eq!(UserRole::CreditBuyer.label(), "Credit Buyer");
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Verifier.can_review());
        assert!(UserRole::Administrator.can_review());
        assert!(!UserRole::CreditBuyer.can_review());
        assert!(UserRole::CreditBuyer.is_self_assignable());
        assert!(!UserRole::Administrator.is_self_assignable());
    }

    #[test]
    fn test_display_name() {
        let mut user = account();
        user.role = UserRole::Verifier;
        assert_eq!(user.display_name(), "greenfields (Verifier)");
    }

    #[test]
    fn test_mobile_validation() {
        assert!(validate_mobile("+14155552671").is_ok());
        assert!(validate_mobile("123456789").is_ok());
        assert!(validate_mobile("12345678").is_err());
        assert!(validate_mobile("+1-415-555").is_err());
        assert!(validate_mobile("1234567890123456").is_err());
    }

    #[test]
    fn test_apply_clears_and_sets_fields() {
        let mut user = account();
        user.mobile = Some("+14155552671".into());

        user.apply(ProfileUpdate {
            mobile: Some(String::new()),
            first_name: Some("Ada".into()),
            has_completed_kyc: Some(true),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(user.mobile, None);
        assert_eq!(user.full_name(), "Ada");
        assert!(user.has_completed_kyc);
    }

    #[test]
    fn test_apply_rejects_bad_mobile() {
        let mut user = account();
        let result = user.apply(ProfileUpdate {
            mobile: Some("not-a-number".into()),
            ..Default::default()
        });
        assert!(result.is_err());
        assert!(user.mobile.is_none());
    }

    #[test]
    fn test_privileged_fields() {
        assert!(ProfileUpdate {
            role: Some(UserRole::Verifier),
            ..Default::default()
        }
        .touches_privileged_fields());
        assert!(!ProfileUpdate {
            first_name: Some("Ada".into()),
            ..Default::default()
        }
        .touches_privileged_fields());
    }
}
