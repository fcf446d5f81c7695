//! Authentication service - Registration, login and token verification.
//!
//! Password hashing lives in the domain `Password` value object; this
//! service only decides who may register and issues JWTs.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{validate_mobile, NewUser, Password, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Argon2 hash that never verifies, checked when the username is unknown
/// so both failure paths cost the same.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$3CnDYTVZ7ybdn6hkGtlmVR3pP9JWcx1U1VGjKjEyRZ8";

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Sign-up data
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Defaults to project developer; only self-assignable roles are accepted
    pub role: Option<UserRole>,
    pub mobile: Option<String>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account with a hashed password
    async fn register(&self, registration: Registration) -> AppResult<User>;

    /// Check credentials and issue a JWT
    async fn login(&self, username: String, password: String) -> AppResult<TokenResponse>;

    /// Verify a JWT and extract its claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        let role = registration.role.unwrap_or_default();
        if !role.is_self_assignable() {
            tracing::warn!(username = %registration.username, %role, "Rejected self-assigned role");
            return Err(AppError::Forbidden);
        }

        let mobile = registration.mobile.filter(|m| !m.is_empty());
        if let Some(mobile) = &mobile {
            validate_mobile(mobile)?;
        }

        let accounts = self.uow.accounts();
        if accounts
            .find_by_username(&registration.username)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Account"));
        }

        let password_hash = Password::new(&registration.password)?.into_string();
        let user = accounts
            .create(NewUser {
                username: registration.username,
                email: registration.email,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                role,
                mobile,
                kyb_link: None,
                firebase_uid: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account registered");
        Ok(user)
    }

    async fn login(&self, username: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.accounts().find_by_username(&username).await?;

        // Verify even for unknown users so timing does not reveal usernames
        let hash = user
            .as_ref()
            .map_or(DUMMY_HASH, |u| u.password_hash.as_str())
            .to_string();
        let password_valid = Password::from_hash(hash).verify(&password);

        match user {
            Some(user) if password_valid && user.is_active => generate_token(&user, &self.config),
            Some(user) if password_valid => {
                tracing::info!(user_id = %user.id, "Login refused for deactivated account");
                Err(AppError::InvalidCredentials)
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{test_config, user_with_password, TestUnitOfWork};
    use crate::infra::repositories::MockAccountRepository;

    fn registration(role: Option<UserRole>) -> Registration {
        Registration {
            username: "greenfields".into(),
            email: "dev@example.com".into(),
            password: "CarbonNeutral2030".into(),
            first_name: "Ada".into(),
            last_name: String::new(),
            role,
            mobile: None,
        }
    }

    #[tokio::test]
    async fn test_register_rejects_privileged_role() {
        let uow = TestUnitOfWork::default();
        let auth = Authenticator::new(Arc::new(uow), test_config());

        let result = auth.register(registration(Some(UserRole::Verifier))).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_username()
            .returning(|_| Ok(Some(user_with_password("greenfields", "whatever-123"))));
        accounts.expect_create().never();

        let uow = TestUnitOfWork::default().with_accounts(accounts);
        let auth = Authenticator::new(Arc::new(uow), test_config());

        let result = auth.register(registration(None)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_defaults_role() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_by_username().returning(|_| Ok(None));
        accounts
            .expect_create()
            .withf(|new| {
                new.role == UserRole::ProjectDeveloper
                    && new.password_hash != "CarbonNeutral2030"
                    && Password::from_hash(new.password_hash.clone()).verify("CarbonNeutral2030")
            })
            .returning(|new| {
                Ok(User::new(Uuid::new_v4(), new.username, new.email, new.password_hash))
            });

        let uow = TestUnitOfWork::default().with_accounts(accounts);
        let auth = Authenticator::new(Arc::new(uow), test_config());

        let user = auth.register(registration(None)).await.unwrap();
        assert_eq!(user.username, "greenfields");
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_username()
            .returning(|name| Ok(Some(user_with_password(name, "CarbonNeutral2030"))));

        let uow = TestUnitOfWork::default().with_accounts(accounts);
        let auth = Authenticator::new(Arc::new(uow), test_config());

        let token = auth
            .login("greenfields".into(), "CarbonNeutral2030".into())
            .await
            .unwrap();
        assert_eq!(token.token_type, "Bearer");

        let claims = auth.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.username, "greenfields");
        assert_eq!(claims.role, UserRole::ProjectDeveloper);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_by_username().returning(|name| {
            if name == "ghost" {
                return Ok(None);
            }
            let mut user = user_with_password(name, "CarbonNeutral2030");
            user.is_active = name != "retired";
            Ok(Some(user))
        });

        let uow = TestUnitOfWork::default().with_accounts(accounts);
        let auth = Authenticator::new(Arc::new(uow), test_config());

        for (username, password) in [
            ("ghost", "CarbonNeutral2030"),
            ("greenfields", "wrong-password"),
            ("retired", "CarbonNeutral2030"),
        ] {
            let result = auth.login(username.into(), password.into()).await;
            assert!(matches!(result, Err(AppError::InvalidCredentials)), "{username}");
        }
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let auth = Authenticator::new(Arc::new(TestUnitOfWork::default()), test_config());
        assert!(matches!(auth.verify_token("not.a.jwt"), Err(AppError::Jwt(_))));
    }
}
