use std::sync::Arc;

use aws_sdk_dynamodb::{types::AttributeValue, Client};
use axum::extract::{Json, State};
use chrono::{Duration, TimeDelta};
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Scrypt,
};
use serde_dynamo::{from_item, to_item};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    constants::USER_TABLE,
    errors::HandlerError,
    models::{
        auth::{LoginPayload, RegisterPayload},
        user::{User, UserInfo, UserRole},
    },
    state::AppState,
    utils::{create_userid, now_millis},
};

const TOKEN_EXPIRATION_DURATION: TimeDelta = Duration::hours(5);

pub fn router() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
}

async fn get_user(client: &Client, id: &str) -> Result<Option<User>, HandlerError> {
    let resp = client
        .get_item()
        .table_name(USER_TABLE)
        .key("id", AttributeValue::S(id.to_string()))
        .send()
        .await?;

    match resp.item {
        Some(item) => Ok(Some(from_item(item)?)),
        None => Ok(None),
    }
}

fn sign_token(state: &AppState, user: &User) -> Result<String, HandlerError> {
    let claim = user.create_claim(TOKEN_EXPIRATION_DURATION);
    Ok(jsonwebtoken::encode(&state.jwt.2, &claim, &state.jwt.0)?)
}

/// Register a buyer or seller account.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body(description = "Register Info", content = RegisterPayload),
    responses(
        (status = OK, description = "Register Success", body = UserInfo),
        (status = BAD_REQUEST, description = "User already exists", body = HandlerError),
        (status = FORBIDDEN, description = "Admin self-registration", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
)]
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<UserInfo>, HandlerError> {
    if payload.role == UserRole::Admin {
        return Err(HandlerError::Forbidden(
            "Admin accounts cannot be self-registered.".to_string(),
        ));
    }

    let client = Client::new(&state.aws_config);
    let id = create_userid(&payload.email, payload.role);

    if get_user(&client, &id).await?.is_some() {
        return Err(HandlerError::InvalidState(
            "User already exists!".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let phash = Scrypt
        .hash_password(payload.password.as_bytes(), &salt)?
        .to_string();

    let user = User {
        id,
        create_at: now_millis(),
        is_active: true,
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        role: payload.role,
        win_count: 0,
        sale_count: 0,
        password: phash,
    };

    client
        .put_item()
        .table_name(USER_TABLE)
        .set_item(Some(to_item(&user)?))
        .send()
        .await?;

    let token = sign_token(&state, &user)?;
    Ok(Json(user.to_user_info(token)))
}

/// Log in with email + password for a given role.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body(description = "Login Info", content = LoginPayload),
    responses(
        (status = OK, description = "Login Success", body = UserInfo),
        (status = UNAUTHORIZED, description = "Wrong password", body = HandlerError),
        (status = FORBIDDEN, description = "Account deactivated", body = HandlerError),
        (status = NOT_FOUND, description = "User not found", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
)]
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<UserInfo>, HandlerError> {
    let client = Client::new(&state.aws_config);
    let id = create_userid(&payload.email, payload.role);

    let user = get_user(&client, &id)
        .await?
        .ok_or_else(|| HandlerError::NotFound(format!("User with id {} doesn't exist.", id)))?;

    if !user.is_active {
        return Err(HandlerError::Forbidden(
            "This account has been deactivated.".to_string(),
        ));
    }

    let phash = PasswordHash::new(&user.password)?;
    Scrypt
        .verify_password(payload.password.as_bytes(), &phash)
        .map_err(|_| HandlerError::Unauthenticated("Wrong email or password.".to_string()))?;

    let token = sign_token(&state, &user)?;
    Ok(Json(user.to_user_info(token)))
}
