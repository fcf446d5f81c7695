//! Account service - Profiles, listings and activation.
//!
//! Accounts are never removed; administrators deactivate them instead.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::Actor;
use crate::domain::{ProfileUpdate, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Own account, or any account for reviewers and admins
    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<User>;

    /// All accounts, newest first (admin only)
    async fn list(&self, actor: Actor, params: PaginationParams) -> AppResult<Paginated<User>>;

    /// Update a profile. Role and KYC status are admin-only fields.
    async fn update_profile(
        &self,
        actor: Actor,
        id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<User>;

    /// Activate or deactivate an account (admin only)
    async fn set_active(&self, actor: Actor, id: Uuid, active: bool) -> AppResult<User>;
}

pub struct AccountManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> AccountManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn load(&self, id: Uuid) -> AppResult<User> {
        self.uow.accounts().find_by_id(id).await?.ok_or_not_found()
    }
}

#[async_trait]
impl<U: UnitOfWork> AccountService for AccountManager<U> {
    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<User> {
        if actor.id != id && !actor.can_review() {
            return Err(AppError::Forbidden);
        }
        self.load(id).await
    }

    async fn list(&self, actor: Actor, params: PaginationParams) -> AppResult<Paginated<User>> {
        actor.require_admin()?;
        let (users, total) = self.uow.accounts().list(params.clone()).await?;
        Ok(Paginated::from_page(users, total, &params))
    }

    async fn update_profile(
        &self,
        actor: Actor,
        id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<User> {
        actor.require_owner_or_admin(id)?;
        if update.touches_privileged_fields() {
            actor.require_admin()?;
        }

        let accounts = self.uow.accounts();
        if let Some(uid) = update.firebase_uid.as_deref().filter(|uid| !uid.is_empty()) {
            if let Some(other) = accounts.find_by_firebase_uid(uid).await? {
                if other.id != id {
                    return Err(AppError::conflict("Firebase UID"));
                }
            }
        }

        let mut user = self.load(id).await?;
        user.apply(update)?;
        accounts.save(user).await
    }

    async fn set_active(&self, actor: Actor, id: Uuid, active: bool) -> AppResult<User> {
        actor.require_admin()?;
        if actor.id == id && !active {
            return Err(AppError::validation("Administrators cannot deactivate themselves"));
        }

        let mut user = self.load(id).await?;
        if user.is_active == active {
            return Ok(user);
        }
        if active {
            user.activate();
        } else {
            user.deactivate();
        }

        tracing::info!(user_id = %id, active, by = %actor.id, "Account activation changed");
        self.uow.accounts().save(user).await
    }
}
