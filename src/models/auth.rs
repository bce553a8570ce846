use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::UserRole;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    /// User first name
    pub first_name: String,
    /// User last name
    pub last_name: String,
    /// User Email
    pub email: String,
    /// Requested role; admin accounts cannot self-register.
    pub role: UserRole,
    /// Plaintext password, hashed server-side.
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    /// User Email
    pub email: String,
    /// Role of the account to log into.
    pub role: UserRole,
    /// Plaintext password.
    pub password: String,
}

/// Borrowed claim, signed at login/registration.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Claim<'a> {
    /// ID
    pub id: &'a str,
    /// User first name
    pub first_name: &'a str,
    /// User last name
    pub last_name: &'a str,
    /// User Email
    pub email: &'a str,
    /// User role
    pub role: UserRole,
    /// Audience
    pub aud: &'a str,
    /// Expire Time, unix seconds
    pub exp: u64,
    /// Issue Time, unix seconds
    pub iat: u64,
}

/// Owned claim, decoded from the bearer token by the auth middleware and
/// handed to handlers as a request extension.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ClaimOwned {
    /// ID
    pub id: String,
    /// User first name
    pub first_name: String,
    /// User last name
    pub last_name: String,
    /// User Email
    pub email: String,
    /// User role
    pub role: UserRole,
    /// Audience
    pub aud: String,
    /// Expire Time, unix seconds
    pub exp: u64,
    /// Issue Time, unix seconds
    pub iat: u64,
}

impl ClaimOwned {
    pub fn as_claim(&self) -> Claim<'_> {
        Claim {
            id: &self.id,
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: &self.email,
            role: self.role,
            aud: &self.aud,
            exp: self.exp,
            iat: self.iat,
        }
    }
}
