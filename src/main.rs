mod constants;
mod errors;
mod lifecycle;
mod middlewares;
mod models;
mod routes;
mod state;
mod utils;

#[cfg(test)]
mod tests;

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use lambda_http::{run, tracing, Error};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use state::AppState;
use tower_http::trace::TraceLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_axum::router::OpenApiRouter;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Auctra API",
        description = "Online auction marketplace: browsing, bidding, buy-now, \
                       favorites, seller consignment, and admin management."
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "http-jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
struct Resp {
    utc: u64,
}

async fn get_utc() -> Json<Resp> {
    let unixtime = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    Json(Resp {
        utc: unixtime.as_secs(),
    })
}

async fn root() -> Json<Value> {
    Json(json!({ "msg": "Auctra API" }))
}

async fn health_check() -> (StatusCode, String) {
    (StatusCode::OK, "Healthy!".to_string())
}

pub(crate) async fn create_service(state: Arc<AppState>) -> Result<Router, Error> {
    let trace_layer =
        TraceLayer::new_for_http().on_request(|req: &Request<Body>, _: &tracing::Span| {
            let path = req.uri().path();
            tracing::info!("Got request with path: {}", path);
        });

    let public = OpenApiRouter::new()
        .nest("/v1", routes::auth::router())
        .nest("/v1/auctions", routes::auction::router());

    let protected = OpenApiRouter::new()
        .nest("/v1", routes::bid::router())
        .nest("/v1/seller", routes::seller::router())
        .nest("/v1/favorites", routes::favorite::router())
        .nest("/v1/admin", routes::admin::router());

    let (public_router, public_api) = public.split_for_parts();
    let (protected_router, protected_api) = protected.split_for_parts();

    let mut api = ApiDoc::openapi();
    api.merge(public_api);
    api.merge(protected_api);
    let yaml = api.to_yaml().map_err(|e| Error::from(e.to_string()))?;

    let app = public_router
        .merge(protected_router.layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::auth::auth_middleware,
        )))
        .route("/v1/", get(root))
        .route("/v1/utc", get(get_utc))
        .route("/v1/health", get(health_check))
        .route(
            "/v1/openapi.yaml",
            get(move || async move { ([(header::CONTENT_TYPE, "application/yaml")], yaml) }),
        )
        .layer(middleware::from_fn(middlewares::trace_client))
        .layer(trace_layer)
        .with_state(state);

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    tracing::info!("Auctra API start");

    let state = Arc::new(AppState::new().await?);
    let app = create_service(state).await?;

    run(app).await
}
