use std::{collections::HashMap, sync::Arc};

use aws_sdk_dynamodb::{
    types::{AttributeValue, KeysAndAttributes, ReturnValue},
    Client,
};
use axum::{
    extract::{Json, Path, State},
    Extension,
};
use serde_dynamo::{from_items, to_item};
use ulid::Ulid;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    constants::{AUCTION_TABLE, FAVORITE_TABLE},
    errors::HandlerError,
    models::{
        auction::Auction, auth::ClaimOwned, bid::Favorite, user::UserRole, PlainSuccessResponse,
    },
    state::AppState,
    utils::now_millis,
};

use super::check_user;

pub fn router() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(list_favorites))
        .routes(routes!(add_favorite, remove_favorite))
}

/// The caller's favorites, hydrated to full auctions.
#[utoipa::path(
    get,
    path = "/",
    tag = "Favorite",
    responses(
        (status = OK, description = "Favorited auctions", body = Vec<Auction>),
        (status = FORBIDDEN, description = "Not a buyer", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn list_favorites(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Auction>>, HandlerError> {
    check_user(claim.as_claim(), UserRole::Buyer)?;

    let client = Client::new(&state.aws_config);

    let query_resp = client
        .query()
        .table_name(FAVORITE_TABLE)
        .key_condition_expression("userId = :uid")
        .expression_attribute_values(":uid", AttributeValue::S(claim.id.clone()))
        .send()
        .await?;

    let favorites: Vec<Favorite> = from_items(query_resp.items().to_vec())?;
    if favorites.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let mut keys = KeysAndAttributes::builder();
    for favorite in &favorites {
        keys = keys.keys(HashMap::from([(
            "id".to_string(),
            AttributeValue::S(favorite.auction_id.to_string()),
        )]));
    }

    let batch_resp = client
        .batch_get_item()
        .request_items(AUCTION_TABLE, keys.build()?)
        .send()
        .await?;

    let items = batch_resp
        .responses()
        .and_then(|tables| tables.get(AUCTION_TABLE))
        .cloned()
        .unwrap_or_default();
    let auctions: Vec<Auction> = from_items(items)?;

    Ok(Json(auctions))
}

/// Favorite an auction. Idempotent.
#[utoipa::path(
    put,
    path = "/{auctionId}",
    tag = "Favorite",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Favorited", body = PlainSuccessResponse),
        (status = FORBIDDEN, description = "Not a buyer", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn add_favorite(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<PlainSuccessResponse, HandlerError> {
    check_user(claim.as_claim(), UserRole::Buyer)?;

    let client = Client::new(&state.aws_config);

    let get_resp = client
        .get_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .send()
        .await?;
    if get_resp.item.is_none() {
        return Err(HandlerError::auction_not_found());
    }

    let favorite = Favorite {
        user_id: claim.id.clone(),
        auction_id,
        create_at: now_millis(),
    };

    client
        .put_item()
        .table_name(FAVORITE_TABLE)
        .set_item(Some(to_item(&favorite)?))
        .send()
        .await?;

    Ok(PlainSuccessResponse::ok("Auction favorited."))
}

/// Remove a favorite.
#[utoipa::path(
    delete,
    path = "/{auctionId}",
    tag = "Favorite",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Removed", body = PlainSuccessResponse),
        (status = FORBIDDEN, description = "Not a buyer", body = HandlerError),
        (status = NOT_FOUND, description = "Not favorited", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn remove_favorite(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<PlainSuccessResponse, HandlerError> {
    check_user(claim.as_claim(), UserRole::Buyer)?;

    let client = Client::new(&state.aws_config);

    let delete_resp = client
        .delete_item()
        .table_name(FAVORITE_TABLE)
        .key("userId", AttributeValue::S(claim.id.clone()))
        .key("auctionId", AttributeValue::S(auction_id.to_string()))
        .return_values(ReturnValue::AllOld)
        .send()
        .await?;

    if delete_resp.attributes().is_none() {
        Err(HandlerError::NotFound("Favorite not found".to_string()))
    } else {
        Ok(PlainSuccessResponse::ok("Favorite removed."))
    }
}
