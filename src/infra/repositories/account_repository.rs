//! Account repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::base::{fetch_page, map_page};
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account repository trait for dependency injection.
///
/// Accounts are never removed; `save` persists activation changes.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_firebase_uid(&self, firebase_uid: &str) -> AppResult<Option<User>>;

    /// Insert a new account. A taken username or firebase uid is a conflict.
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Persist every mutable field of an existing account
    async fn save(&self, user: User) -> AppResult<User>;

    /// Accounts, newest first
    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)>;
}

/// SeaORM implementation of AccountRepository
pub struct AccountStore {
    db: DatabaseConnection,
}

impl AccountStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for AccountStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn find_by_firebase_uid(&self, firebase_uid: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::FirebaseUid.eq(firebase_uid))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn create(&self, new: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(new.username),
            email: Set(new.email),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            password_hash: Set(new.password_hash),
            role: Set(new.role.into()),
            mobile: Set(new.mobile),
            kyb_link: Set(new.kyb_link),
            is_project_proponent: Set(false),
            has_completed_kyc: Set(false),
            firebase_uid: Set(new.firebase_uid),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Account"))?;
        Ok(User::from(model))
    }

    async fn save(&self, user: User) -> AppResult<User> {
        let existing = UserEntity::find_by_id(user.id)
            .one(&self.db)
            .await?
            .ok_or_not_found()?;

        let mut active: ActiveModel = existing.into();
        active.email = Set(user.email);
        active.first_name = Set(user.first_name);
        active.last_name = Set(user.last_name);
        active.password_hash = Set(user.password_hash);
        active.role = Set(user.role.into());
        active.mobile = Set(user.mobile);
        active.kyb_link = Set(user.kyb_link);
        active.is_project_proponent = Set(user.is_project_proponent);
        active.has_completed_kyc = Set(user.has_completed_kyc);
        active.firebase_uid = Set(user.firebase_uid);
        active.is_active = Set(user.is_active);
        active.updated_at = Set(Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Account"))?;
        Ok(User::from(model))
    }

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let query = UserEntity::find().order_by_desc(user::Column::CreatedAt);
        Ok(map_page(fetch_page(&self.db, query, &params).await?))
    }
}
