mod auth;
mod marketplace;

use std::{env, sync::Arc};

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    response::Response,
};
use chrono::Duration;
use lambda_http::Error;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    models::user::{User, UserRole},
    state::AppState,
    utils::{create_userid, now_millis},
};

// base64("auctra-test-secret")
const TEST_JWT_SECRET: &str = "YXVjdHJhLXRlc3Qtc2VjcmV0";

pub async fn test_state() -> Result<Arc<AppState>, Error> {
    if env::var("JWT_SECRET").is_err() {
        env::set_var("JWT_SECRET", TEST_JWT_SECRET);
    }
    Ok(Arc::new(AppState::test().await?))
}

/// A signed token for a synthetic user of the given role, without touching
/// the user table.
pub fn make_token(state: &AppState, email: &str, role: UserRole) -> Result<String, Error> {
    let user = User {
        id: create_userid(email, role),
        create_at: now_millis(),
        is_active: true,
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: email.to_string(),
        role,
        win_count: 0,
        sale_count: 0,
        password: String::new(),
    };
    let claim = user.create_claim(Duration::hours(1));
    Ok(jsonwebtoken::encode(&state.jwt.2, &claim, &state.jwt.0)?)
}

async fn parse_resp<T: DeserializeOwned>(resp: Response<Body>) -> Result<T, Error> {
    let body = resp.into_body();
    let limit = body.size_hint().upper().unwrap_or(u64::MAX) as usize;
    let data = axum::body::to_bytes(body, limit).await?;
    let res: T = serde_json::from_slice(&data)?;

    Ok(res)
}

fn build_request<T: Serialize>(
    method: &str,
    uri: &str,
    token: &str,
    body: Option<T>,
) -> Result<Request<Body>, Error> {
    let req = match body {
        Some(v) => {
            let content = serde_json::to_string(&v)?;
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::new(content))
        }
        None => Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty()),
    }?;
    Ok(req)
}
