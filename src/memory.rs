//! In-memory stores backing router tests. Mirrors the UNIQUE constraints of the schema.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{
    repo::UserStore,
    repo_types::{NewUser, ProfileChanges, User},
};
use crate::data::{
    repo::DataStore,
    repo_types::{DataChanges, DataRecord, NewData},
};
use crate::db::{StoreError, UniqueField};
use crate::validation::{
    MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_SENTIMENT_LENGTH, MAX_SOURCE_LENGTH,
    MAX_USERNAME_LENGTH,
};

/// Fails like a VARCHAR column rejecting an over-long value.
fn fits(value: &str, max: usize) -> Result<(), StoreError> {
    if value.chars().count() > max {
        return Err(StoreError::Database(sqlx::Error::Protocol(
            "value too long for type character varying".into(),
        )));
    }
    Ok(())
}

fn check_user_columns(user: &User) -> Result<(), StoreError> {
    fits(&user.name, MAX_NAME_LENGTH)?;
    fits(&user.username, MAX_USERNAME_LENGTH)?;
    fits(&user.email, MAX_EMAIL_LENGTH)
}

fn check_data_columns(row: &DataRow) -> Result<(), StoreError> {
    fits(&row.source, MAX_SOURCE_LENGTH)?;
    fits(&row.sentiment, MAX_SENTIMENT_LENGTH)
}

#[derive(Debug, Clone)]
struct DataRow {
    id: Uuid,
    source: String,
    sentiment: String,
    text: String,
    created_date: OffsetDateTime,
    user_id: Uuid,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    data: Vec<DataRow>,
}

impl Tables {
    fn check_unique(&self, user: &User) -> Result<(), StoreError> {
        for other in self.users.iter().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(StoreError::Duplicate(UniqueField::Username));
            }
            if other.email == user.email {
                return Err(StoreError::Duplicate(UniqueField::Email));
            }
        }
        Ok(())
    }

    fn joined(&self, row: &DataRow) -> DataRecord {
        let owner_username = self
            .users
            .iter()
            .find(|u| u.id == row.user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        DataRecord {
            id: row.id,
            source: row.source.clone(),
            sentiment: row.sentiment.clone(),
            text: row.text.clone(),
            created_date: row.created_date,
            user_id: row.user_id,
            owner_username,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock poisoned")
    }

    fn with_user(&self, id: Uuid, apply: impl FnOnce(&mut User)) -> Result<User, StoreError> {
        let mut tables = self.lock();
        let mut patched = tables
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        apply(&mut patched);
        check_user_columns(&patched)?;
        tables.check_unique(&patched)?;
        if let Some(slot) = tables.users.iter_mut().find(|u| u.id == id) {
            *slot = patched.clone();
        }
        Ok(patched)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn username_taken(
        &self,
        username: &str,
        except: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .any(|u| u.username == username && Some(u.id) != except))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_date: OffsetDateTime::now_utc(),
            token: None,
            reset_token: None,
        };
        check_user_columns(&user)?;
        let mut tables = self.lock();
        tables.check_unique(&user)?;
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn set_token(&self, id: Uuid, token: &str) -> Result<User, StoreError> {
        self.with_user(id, |u| u.token = Some(token.to_string()))
    }

    async fn set_reset_token(&self, id: Uuid, reset_token: &str) -> Result<User, StoreError> {
        self.with_user(id, |u| u.reset_token = Some(reset_token.to_string()))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<User, StoreError> {
        self.with_user(id, |u| u.password_hash = password_hash.to_string())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User, StoreError> {
        self.with_user(id, |u| {
            if let Some(name) = changes.name {
                u.name = name;
            }
            if let Some(username) = changes.username {
                u.username = username;
            }
            if let Some(email) = changes.email {
                u.email = email;
            }
        })
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<DataRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .data
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| tables.joined(d))
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<DataRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables.data.iter().find(|d| d.id == id).map(|d| tables.joined(d)))
    }

    async fn insert(&self, new_data: NewData) -> Result<DataRecord, StoreError> {
        let mut tables = self.lock();
        if !tables.users.iter().any(|u| u.id == new_data.user_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let row = DataRow {
            id: Uuid::new_v4(),
            source: new_data.source,
            sentiment: new_data.sentiment,
            text: new_data.text,
            created_date: OffsetDateTime::now_utc(),
            user_id: new_data.user_id,
        };
        check_data_columns(&row)?;
        tables.data.push(row.clone());
        Ok(tables.joined(&row))
    }

    async fn apply_changes(
        &self,
        id: Uuid,
        changes: DataChanges,
    ) -> Result<Option<DataRecord>, StoreError> {
        let mut tables = self.lock();
        let Some(slot) = tables.data.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        let mut row = slot.clone();
        if let Some(source) = changes.source {
            row.source = source;
        }
        if let Some(sentiment) = changes.sentiment {
            row.sentiment = sentiment;
        }
        if let Some(text) = changes.text {
            row.text = text;
        }
        check_data_columns(&row)?;
        *slot = row.clone();
        Ok(Some(tables.joined(&row)))
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        let before = tables.data.len();
        tables.data.retain(|d| d.id != id);
        Ok(tables.data.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            name: username.into(),
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn enforces_unique_username_and_email() {
        let store = MemoryStore::default();
        store.create(new_user("alice", "a@example.com")).await.unwrap();

        let err = store.create(new_user("alice", "b@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Username)));

        let err = store.create(new_user("bob", "a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));
    }

    #[tokio::test]
    async fn profile_update_rejects_taking_anothers_email() {
        let store = MemoryStore::default();
        store.create(new_user("alice", "a@example.com")).await.unwrap();
        let bob = store.create(new_user("bob", "b@example.com")).await.unwrap();

        let changes = ProfileChanges {
            name: Some("Robert".into()),
            email: Some("a@example.com".into()),
            ..Default::default()
        };
        let err = store.update_profile(bob.id, changes).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));

        let stored = UserStore::find_by_id(&store, bob.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "b@example.com");
        assert_eq!(stored.name, "bob");
    }

    #[tokio::test]
    async fn setters_only_touch_their_own_column() {
        let store = MemoryStore::default();
        let alice = store.create(new_user("alice", "a@example.com")).await.unwrap();

        store.set_password(alice.id, "rotated").await.unwrap();
        let after = store.set_token(alice.id, "Bearer t").await.unwrap();
        assert_eq!(after.password_hash, "rotated");
        assert_eq!(after.token.as_deref(), Some("Bearer t"));
        assert_eq!(after.created_date, alice.created_date);
    }

    #[tokio::test]
    async fn over_long_values_fail_like_the_schema() {
        let store = MemoryStore::default();
        let err = store
            .create(new_user("a_twenty_one_chars_xx", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(store.find_by_email("a@example.com").await.unwrap().is_none());
    }
}
