//! User Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::serde_helpers;

/// User ID type
pub type UserId = RecordId;

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

/// Saved shipping address on a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAddress {
    #[serde(default = "default_address_label")]
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

fn default_address_label() -> String {
    "home".to_string()
}

/// User account. `password` holds the argon2 hash and is never serialized
/// back to callers; the repository binds it explicitly on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub addresses: Vec<SavedAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.password)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Register payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub phone: Option<String>,
}

/// Login payload
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub addresses: Option<Vec<SavedAddress>>,
}

/// Change password payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = User::hash_password("s3cret-pass").expect("hash");
        let user = User {
            id: None,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: hash,
            phone: None,
            role: UserRole::Customer,
            is_verified: false,
            addresses: vec![],
            created_at: None,
        };

        assert!(user.verify_password("s3cret-pass").unwrap());
        assert!(!user.verify_password("wrong").unwrap());
    }

    #[test]
    fn test_password_not_serialized() {
        let user = User {
            id: None,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: "hash".to_string(),
            phone: None,
            role: UserRole::Admin,
            is_verified: true,
            addresses: vec![],
            created_at: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
    }
}
