use std::collections::BTreeMap;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::repo::{StoreResult, UserStore};
use super::repo_types::{ConflictCandidate, NewUser, PublicUser, UserChanges, UserRow};
use crate::error::{ConflictField, StoreError};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserRow>,
    last_id: i64,
}

impl Tables {
    // Mirrors the table's unique constraints, email first.
    fn check_unique(&self, email: &str, username: &str, skip: Option<i64>) -> StoreResult<()> {
        let others: Vec<&UserRow> = self
            .users
            .values()
            .filter(|u| Some(u.id) != skip)
            .collect();
        if others.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation(ConflictField::Email));
        }
        if others.iter().any(|u| u.username == username) {
            return Err(StoreError::UniqueViolation(ConflictField::Username));
        }
        Ok(())
    }
}

/// `UserStore` kept in process memory, used by tests and the fake app state.
#[derive(Default)]
pub struct MemoryUserStore {
    tables: Mutex<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> StoreResult<Vec<PublicUser>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .rev()
            .cloned()
            .map(PublicUser::from)
            .collect())
    }

    async fn find_public(&self, id: i64) -> StoreResult<Option<PublicUser>> {
        Ok(self.find_by_id(id).await?.map(PublicUser::from))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRow>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_conflict(
        &self,
        email: &str,
        username: &str,
        exclude_id: Option<i64>,
    ) -> StoreResult<Option<ConflictCandidate>> {
        let tables = self.tables.lock().await;
        let users = &tables.users;
        let others = || users.values().filter(move |u| Some(u.id) != exclude_id);
        Ok(others()
            .find(|u| u.email == email)
            .or_else(|| others().find(|u| u.username == username))
            .map(|u| ConflictCandidate {
                id: u.id,
                email: u.email.clone(),
                username: u.username.clone(),
            }))
    }

    async fn insert(&self, user: NewUser) -> StoreResult<PublicUser> {
        let mut tables = self.tables.lock().await;
        tables.check_unique(&user.email, &user.username, None)?;
        tables.last_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = UserRow {
            id: tables.last_id,
            name: user.name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row.into())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<PublicUser>> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        tables.check_unique(&changes.email, &changes.username, Some(id))?;
        let Some(row) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        row.name = changes.name;
        row.username = changes.username;
        row.email = changes.email;
        if let Some(hash) = changes.password_hash {
            row.password_hash = hash;
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone().into()))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.lock().await.users.remove(&id).is_some())
    }
}

#[cfg(test)]
mod memory_tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            name: username.to_uppercase(),
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order_and_listed_descending() {
        let store = MemoryUserStore::new();
        let a = store.insert(new_user("a", "a@x.io")).await.unwrap();
        let b = store.insert(new_user("b", "b@x.io")).await.unwrap();
        assert!(b.id > a.id);

        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn insert_enforces_unique_email_before_username() {
        let store = MemoryUserStore::new();
        store.insert(new_user("a", "a@x.io")).await.unwrap();
        let err = store.insert(new_user("a", "a@x.io")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(ConflictField::Email)));
        let err = store.insert(new_user("a", "other@x.io")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(ConflictField::Username)));
    }

    #[tokio::test]
    async fn update_keeps_hash_when_none_given() {
        let store = MemoryUserStore::new();
        let a = store.insert(new_user("a", "a@x.io")).await.unwrap();
        let changes = UserChanges {
            name: "Renamed".into(),
            username: "a".into(),
            email: "a@x.io".into(),
            password_hash: None,
        };
        let updated = store.update(a.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        let row = store.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(row.password_hash, "hash");
    }

    #[tokio::test]
    async fn conflict_lookup_skips_excluded_id() {
        let store = MemoryUserStore::new();
        let a = store.insert(new_user("a", "a@x.io")).await.unwrap();
        assert!(store
            .find_conflict("a@x.io", "a", Some(a.id))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_conflict("a@x.io", "zzz", None)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn conflict_lookup_prefers_email_owner() {
        let store = MemoryUserStore::new();
        store.insert(new_user("a", "first@x.io")).await.unwrap();
        let b = store.insert(new_user("b", "a@x.io")).await.unwrap();
        let hit = store.find_conflict("a@x.io", "a", None).await.unwrap().unwrap();
        assert_eq!(hit.id, b.id);
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let store = MemoryUserStore::new();
        let a = store.insert(new_user("a", "a@x.io")).await.unwrap();
        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
    }
}
