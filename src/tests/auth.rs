use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use lambda_http::{tower::ServiceExt, Error};

use crate::{
    create_service,
    models::user::UserRole,
    tests::{build_request, make_token, test_state},
};

#[tokio::test]
async fn test_root_and_health() -> Result<(), Error> {
    let state = test_state().await?;
    let service = create_service(state.clone()).await?;
    let request = Request::builder().uri("/v1/").body(Body::empty())?;

    let response = service.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let service = create_service(state).await?;
    let request = Request::builder().uri("/v1/health").body(Body::empty())?;

    let response = service.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_openapi_yaml_served() -> Result<(), Error> {
    let state = test_state().await?;
    let service = create_service(state).await?;
    let request = Request::builder()
        .uri("/v1/openapi.yaml")
        .body(Body::empty())?;

    let response = service.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_protected_route_requires_token() -> Result<(), Error> {
    let state = test_state().await?;
    let service = create_service(state).await?;

    let req = Request::builder()
        .method("POST")
        .uri("/v1/admin/sweep")
        .body(Body::empty())?;
    let resp = service.oneshot(req).await?;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_protected_route_rejects_garbage_token() -> Result<(), Error> {
    let state = test_state().await?;
    let service = create_service(state).await?;

    let req = build_request::<()>("POST", "/v1/admin/sweep", "not-a-jwt", None)?;
    let resp = service.oneshot(req).await?;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_role_is_enforced_before_any_work() -> Result<(), Error> {
    let state = test_state().await?;
    let service = create_service(state.clone()).await?;

    // Valid buyer token on an admin-only route: the middleware accepts the
    // token, the role check rejects the caller.
    let token = make_token(&state, "buyer@test.org", UserRole::Buyer)?;
    let req = build_request::<()>("POST", "/v1/admin/sweep", &token, None)?;
    let resp = service.oneshot(req).await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_seller_cannot_bid() -> Result<(), Error> {
    let state = test_state().await?;
    let service = create_service(state.clone()).await?;

    let token = make_token(&state, "seller@test.org", UserRole::Seller)?;
    let body = serde_json::json!({
        "auctionId": ulid::Ulid::new().to_string(),
        "bidAmount": 100,
    });
    let req = build_request("POST", "/v1/bids", &token, Some(body))?;
    let resp = service.oneshot(req).await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_oversized_consignment_rejected() -> Result<(), Error> {
    let state = test_state().await?;
    let service = create_service(state.clone()).await?;

    // Input bounds are checked before any storage call, so an absurd
    // startingPrice gets a 400 even with no table behind the service.
    let token = make_token(&state, "seller@test.org", UserRole::Seller)?;
    let body = serde_json::json!({
        "title": "Test lot",
        "description": "",
        "category": "misc",
        "startingPrice": u64::MAX,
        "minIncrement": 25,
        "auctionLength": 60_000,
    });
    let req = build_request("PUT", "/v1/seller/auctions", &token, Some(body))?;
    let resp = service.oneshot(req).await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_admin_cannot_self_register() -> Result<(), Error> {
    let state = test_state().await?;
    let service = create_service(state).await?;

    let payload = serde_json::json!({
        "firstName": "Eve",
        "lastName": "Admin",
        "email": "eve@test.org",
        "role": "admin",
        "password": "hunter2",
    });
    let content = serde_json::to_string(&payload)?;
    let req = Request::builder()
        .method("POST")
        .uri("/v1/register")
        .header("Content-Type", "application/json")
        .body(Body::new(content))?;
    let resp = service.oneshot(req).await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    Ok(())
}
