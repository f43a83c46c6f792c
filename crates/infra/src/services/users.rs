use thiserror::Error;
use tracing::instrument;

use subhub_core::{Entity, UserId};
use subhub_users::User;

use super::{ServiceFailure, traced};
use crate::entity_store::{EntityStore, StoreError, StoreTx, UniqueField};
use crate::read_model::{UserView, load_user_view};

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("User does not exist")]
    NotFound,

    #[error("ID already exists")]
    IdExists,

    #[error("Email already exists")]
    EmailExists,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceFailure for UserServiceError {
    fn is_fault(&self) -> bool {
        matches!(self, UserServiceError::Store(_))
    }
}

fn map_write_error(err: StoreError) -> UserServiceError {
    match err {
        StoreError::UniqueViolation(UniqueField::UserId) => UserServiceError::IdExists,
        StoreError::UniqueViolation(UniqueField::UserEmail) => UserServiceError::EmailExists,
        other => UserServiceError::Store(other),
    }
}

/// User operations. Users are always returned with their subscriptions.
#[derive(Debug, Clone)]
pub struct UserService<S> {
    store: S,
}

impl<S: EntityStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    pub async fn create(&self, user: User) -> Result<UserView, UserServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            tx.insert_user(&user).await.map_err(map_write_error)?;
            tx.commit().await?;
            Ok::<_, UserServiceError>(UserView {
                user,
                subscriptions: Vec::new(),
            })
        }
        .await;
        traced("users.create", result)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Result<UserView, UserServiceError> {
        let mut tx = self.store.begin().await?;
        let user = tx.get_user(id).await?.ok_or(UserServiceError::NotFound)?;
        Ok(load_user_view(&mut tx, user).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<UserView, UserServiceError> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_email(email)
            .await?
            .ok_or(UserServiceError::NotFound)?;
        Ok(load_user_view(&mut tx, user).await?)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserView>, UserServiceError> {
        let mut tx = self.store.begin().await?;
        let users = tx.list_users().await?;
        let mut views = Vec::with_capacity(users.len());
        for user in users {
            views.push(load_user_view(&mut tx, user).await?);
        }
        Ok(views)
    }

    /// Replace a user's attributes. Any change is allowed as long as the
    /// email stays unique.
    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    pub async fn update(&self, user: User) -> Result<UserView, UserServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let updated = tx
                .update_user(&user)
                .await
                .map_err(map_write_error)?
                .ok_or(UserServiceError::NotFound)?;
            let view = load_user_view(&mut tx, updated).await?;
            tx.commit().await?;
            Ok::<_, UserServiceError>(view)
        }
        .await;
        traced("users.update", result)
    }

    /// Delete a user and all of its subscriptions. Returns the user as it was
    /// just before deletion.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<UserView, UserServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let user = tx.get_user(id).await?.ok_or(UserServiceError::NotFound)?;
            let view = load_user_view(&mut tx, user).await?;
            tx.delete_user(id)
                .await?
                .ok_or(UserServiceError::NotFound)?;
            tx.commit().await?;
            Ok::<_, UserServiceError>(view)
        }
        .await;
        traced("users.delete", result)
    }
}
