//! User Repository
//!
//! The password hash is bound explicitly on insert/update; the `User`
//! struct never serializes it, so `.content()` cannot be used here.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{ProfileUpdate, User};

const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by lowercased email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_lowercase()))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let record = parse_record_id(USER_TABLE, id);
        let user: Option<User> = self.base.db().select(record).await?;
        Ok(user)
    }

    /// Create an account. `password_hash` must already be an argon2 hash.
    pub async fn create(
        &self,
        name: String,
        email: String,
        password_hash: String,
        phone: Option<String>,
    ) -> RepoResult<User> {
        let mut result = self
            .base
            .db()
            .query(
                "CREATE user SET \
                    name = $name, \
                    email = $email, \
                    password = $password, \
                    phone = $phone, \
                    role = 'customer', \
                    is_verified = false, \
                    addresses = [], \
                    created_at = $created_at",
            )
            .bind(("name", name))
            .bind(("email", email.to_lowercase()))
            .bind(("password", password_hash))
            .bind(("phone", phone))
            .bind(("created_at", now_rfc3339()))
            .await?;
        let users: Vec<User> = result.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Update profile fields (partial)
    pub async fn update_profile(&self, id: &str, data: ProfileUpdate) -> RepoResult<User> {
        let record = parse_record_id(USER_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.phone.is_some() {
            set_parts.push("phone = $phone");
        }
        if data.addresses.is_some() {
            set_parts.push("addresses = $addresses");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound("User not found".to_string()));
        }

        let sql = format!("UPDATE $record SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(sql).bind(("record", record));
        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.phone {
            query = query.bind(("phone", v));
        }
        if let Some(v) = data.addresses {
            query = query.bind(("addresses", v));
        }

        let mut result = query.await?;
        let users: Vec<User> = result.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound("User not found".to_string()))
    }

    /// Replace the stored password hash
    pub async fn set_password(&self, id: &str, password_hash: String) -> RepoResult<()> {
        let record = parse_record_id(USER_TABLE, id);
        self.base
            .db()
            .query("UPDATE $record SET password = $password")
            .bind(("record", record))
            .bind(("password", password_hash))
            .await?
            .check()?;
        Ok(())
    }
}
