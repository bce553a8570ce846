use std::fmt;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::auth::Claim;
use crate::utils::now_millis;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Seller,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            UserRole::Buyer => write!(f, "buyer"),
            UserRole::Seller => write!(f, "seller"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// ID, hash key
    pub id: String,
    /// Create time, in unix millis
    pub create_at: u64,
    /// Deactivated users cannot log in
    pub is_active: bool,
    /// User first name
    pub first_name: String,
    /// User last name
    pub last_name: String,
    /// User Email
    pub email: String,
    /// User role
    pub role: UserRole,
    /// Auctions won at completion time
    pub win_count: u64,
    /// Auctions sold as the consigning seller
    pub sale_count: u64,
    /// Password in scrypt PHC format
    pub password: String,
}

impl User {
    pub fn create_claim(&self, expiration: TimeDelta) -> Claim<'_> {
        let iat = now_millis() / 1000;
        Claim {
            id: &self.id,
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: &self.email,
            role: self.role,
            aud: crate::constants::JWT_AUDIENCE,
            exp: iat + expiration.num_seconds() as u64,
            iat,
        }
    }

    pub fn to_user_info(&self, token: String) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            role: self.role,
            token,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
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
    /// Signed JWT token.
    pub token: String,
}
