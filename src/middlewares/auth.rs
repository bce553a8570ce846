use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{self, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, Validation};

use crate::{
    constants::JWT_AUDIENCE,
    models::{auth::ClaimOwned, ErrorResponse, GeneralResult},
    state::AppState,
};

/// Caller identity is decoded here once and handed to handlers as a request
/// extension; no handler reads ambient auth state.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> GeneralResult<Response<Body>> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .map(|h| h.to_str());
    let header = match auth_header {
        Some(h) => h.map_err(|e| {
            ErrorResponse::new(
                StatusCode::UNAUTHORIZED,
                format!("Failed to down cast header value to string: {}", e),
            )
        })?,
        None => {
            return Err(ErrorResponse::new(
                StatusCode::UNAUTHORIZED,
                "Missing authorization header.",
            ))
        }
    };
    // token should be "Bearer ..."
    let mut it = header.split_whitespace();
    let (_, token_str) = (it.next(), it.next());
    let token = token_str.ok_or(ErrorResponse::new(
        StatusCode::UNAUTHORIZED,
        "Empty token value",
    ))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[JWT_AUDIENCE]);
    let data = jsonwebtoken::decode::<ClaimOwned>(token, &state.jwt.1, &validation).map_err(
        |e| {
            ErrorResponse::new(
                StatusCode::UNAUTHORIZED,
                format!("Failed to decode JWT token: {}", e),
            )
        },
    )?;
    req.extensions_mut().insert(data.claims);

    Ok(next.run(req).await)
}
