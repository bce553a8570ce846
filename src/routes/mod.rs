use crate::{
    errors::HandlerError,
    models::{auth::Claim, user::UserRole},
};

pub mod admin;
pub mod auction;
pub mod auth;
pub mod bid;
pub mod favorite;
pub mod seller;

fn check_user(claim: Claim, role: UserRole) -> Result<(), HandlerError> {
    if claim.role != role {
        return Err(HandlerError::Forbidden(format!(
            "Only {} can use this.",
            role
        )));
    }
    Ok(())
}
