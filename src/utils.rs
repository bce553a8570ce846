use base64::{prelude::BASE64_URL_SAFE, Engine};
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake128,
};

use crate::models::user::UserRole;

/// Derive a stable user id from email + role. The same email may hold
/// accounts of different roles; each gets its own id.
pub fn create_userid(email: &str, role: UserRole) -> String {
    let mut hasher = Shake128::default();
    hasher.update(email.as_bytes());
    hasher.update(role.to_string().as_bytes());
    let mut reader = hasher.finalize_xof();
    let mut buf = [0u8; 12];
    reader.read(&mut buf);
    let suffix = BASE64_URL_SAFE.encode(buf);
    format!("{}_{}", role, suffix)
}

/// Current wall-clock time as unix milliseconds, the timestamp unit used
/// across every table.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userid_is_deterministic() {
        let a = create_userid("foo@test.org", UserRole::Buyer);
        let b = create_userid("foo@test.org", UserRole::Buyer);
        assert_eq!(a, b);
    }

    #[test]
    fn userid_varies_by_role() {
        let buyer = create_userid("foo@test.org", UserRole::Buyer);
        let seller = create_userid("foo@test.org", UserRole::Seller);
        assert_ne!(buyer, seller);
        assert!(buyer.starts_with("buyer_"));
        assert!(seller.starts_with("seller_"));
    }
}
