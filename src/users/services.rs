use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{debug, info};

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::password::hash_password;
use super::repo::UserStore;
use super::repo_types::{ConflictCandidate, NewUser, PublicUser, UserChanges};
use crate::error::{ConflictField, UserError};
use crate::response::Reply;

const MSG_LIST: &str = "List of users";
const MSG_CREATED: &str = "User created";
const MSG_DETAIL: &str = "User details";
const MSG_UPDATED: &str = "User updated";
const MSG_DELETED: &str = "User deleted";

/// CRUD over user records. Every operation answers with an envelope; failures
/// never escape as Rust errors.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Reply<Vec<PublicUser>> {
        match self.store.list().await {
            Ok(users) => Reply::data(StatusCode::OK, MSG_LIST, users),
            Err(e) => UserError::from(e).into_reply("list users"),
        }
    }

    pub async fn create(&self, req: CreateUserRequest) -> Reply<PublicUser> {
        match self.try_create(req).await {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, "user created");
                Reply::data(StatusCode::CREATED, MSG_CREATED, user)
            }
            Err(e) => e.into_reply("create user"),
        }
    }

    /// `raw_id` is the path segment as sent; anything that is not an integer
    /// is answered as not found.
    pub async fn get_by_id(&self, raw_id: &str) -> Reply<PublicUser> {
        match self.try_get(raw_id).await {
            Ok(user) => Reply::data(StatusCode::OK, MSG_DETAIL, user),
            Err(e) => e.into_reply("get user"),
        }
    }

    pub async fn update(&self, raw_id: &str, req: UpdateUserRequest) -> Reply<PublicUser> {
        match self.try_update(raw_id, req).await {
            Ok(user) => {
                info!(user_id = user.id, "user updated");
                Reply::data(StatusCode::OK, MSG_UPDATED, user)
            }
            Err(e) => e.into_reply("update user"),
        }
    }

    pub async fn delete(&self, raw_id: &str) -> Reply<()> {
        match self.try_delete(raw_id).await {
            Ok(id) => {
                info!(user_id = id, "user deleted");
                Reply::message(StatusCode::OK, MSG_DELETED)
            }
            Err(e) => e.into_reply("delete user"),
        }
    }

    async fn try_create(&self, req: CreateUserRequest) -> Result<PublicUser, UserError> {
        if let Some(existing) = self
            .store
            .find_conflict(&req.email, &req.username, None)
            .await?
        {
            return Err(reject(&existing, &req.email, &req.username));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .store
            .insert(NewUser {
                name: req.name,
                username: req.username,
                email: req.email,
                password_hash,
            })
            .await?;
        Ok(user)
    }

    async fn try_get(&self, raw_id: &str) -> Result<PublicUser, UserError> {
        let id = parse_user_id(raw_id).ok_or(UserError::NotFound)?;
        self.store
            .find_public(id)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn try_update(
        &self,
        raw_id: &str,
        req: UpdateUserRequest,
    ) -> Result<PublicUser, UserError> {
        let id = parse_user_id(raw_id).ok_or(UserError::NotFound)?;
        let current = self.store.find_by_id(id).await?.ok_or(UserError::NotFound)?;

        if let Some(existing) = self
            .store
            .find_conflict(&req.email, &req.username, Some(current.id))
            .await?
        {
            return Err(reject(&existing, &req.email, &req.username));
        }

        let password_hash = match req.new_password() {
            Some(plain) => Some(hash_password(plain)?),
            None => {
                debug!(user_id = id, "no new password, keeping stored hash");
                None
            }
        };

        self.store
            .update(
                id,
                UserChanges {
                    name: req.name,
                    username: req.username,
                    email: req.email,
                    password_hash,
                },
            )
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn try_delete(&self, raw_id: &str) -> Result<i64, UserError> {
        let id = parse_user_id(raw_id).ok_or(UserError::NotFound)?;
        self.store.find_by_id(id).await?.ok_or(UserError::NotFound)?;
        if !self.store.delete(id).await? {
            return Err(UserError::NotFound);
        }
        Ok(id)
    }
}

fn reject(existing: &ConflictCandidate, email: &str, username: &str) -> UserError {
    let field = conflict_field(existing, email, username);
    debug!(existing_id = existing.id, field = field.as_str(), "unique pre-check hit");
    UserError::Conflict(field)
}

fn parse_user_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

// Email wins when both collide; a candidate matching neither (changed under
// us) is reported as email.
fn conflict_field(existing: &ConflictCandidate, email: &str, username: &str) -> ConflictField {
    if existing.email == email {
        ConflictField::Email
    } else if existing.username == username {
        ConflictField::Username
    } else {
        ConflictField::Email
    }
}
