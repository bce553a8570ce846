use std::{collections::HashMap, sync::Arc};

use aws_sdk_dynamodb::{types::AttributeValue, Client};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    Extension,
};
use serde_dynamo::{from_item, from_items, to_attribute_value, to_item};
use ulid::Ulid;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    constants::{AUCTION_SELLER_INDEX, AUCTION_TABLE},
    errors::HandlerError,
    models::{
        auction::{Auction, AuctionStatus, CreateAuctionRequest, UpdateAuctionRequest},
        auth::ClaimOwned,
        user::UserRole,
        PlainSuccessResponse,
    },
    state::AppState,
    utils::now_millis,
};

use super::check_user;

pub fn router() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(seller_get_auctions, seller_create_auction))
        .routes(routes!(seller_get_auction_by_id, seller_update_auction_by_id))
        .routes(routes!(seller_submit_auction_by_id))
        .routes(routes!(seller_cancel_auction_by_id))
}

/// Load an auction and verify the caller owns it.
async fn get_owned_auction(
    client: &Client,
    auction_id: Ulid,
    seller_id: &str,
) -> Result<Auction, HandlerError> {
    let get_resp = client
        .get_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .send()
        .await?;

    let item = get_resp.item.ok_or(HandlerError::auction_not_found())?;
    let auction: Auction = from_item(item)?;

    if auction.seller_id != seller_id {
        return Err(HandlerError::Forbidden(
            "You do not own this auction.".to_string(),
        ));
    }
    Ok(auction)
}

/// All of the seller's consigned auctions.
#[utoipa::path(
    get,
    path = "/auctions",
    tag = "Seller",
    responses(
        (status = OK, description = "Returns all seller auctions", body = Vec<Auction>),
        (status = FORBIDDEN, description = "Not a seller", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn seller_get_auctions(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Auction>>, HandlerError> {
    check_user(claim.as_claim(), UserRole::Seller)?;

    let client = Client::new(&state.aws_config);

    let query_resp = client
        .query()
        .table_name(AUCTION_TABLE)
        .index_name(AUCTION_SELLER_INDEX)
        .key_condition_expression("sellerId = :sid")
        .expression_attribute_values(":sid", AttributeValue::S(claim.id.clone()))
        .send()
        .await?;

    let auctions: Vec<Auction> = from_items(query_resp.items().to_vec())?;

    Ok(Json(auctions))
}

/// Consign a new auction; it starts as a draft.
#[utoipa::path(
    put,
    path = "/auctions",
    tag = "Seller",
    request_body = CreateAuctionRequest,
    responses(
        (status = CREATED, description = "Draft created", body = Auction),
        (status = BAD_REQUEST, description = "Invalid pricing", body = HandlerError),
        (status = FORBIDDEN, description = "Not a seller", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn seller_create_auction(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAuctionRequest>,
) -> Result<(StatusCode, Json<Auction>), HandlerError> {
    check_user(claim.as_claim(), UserRole::Seller)?;
    payload.validate()?;

    let client = Client::new(&state.aws_config);

    let auction = Auction::new_from_request(claim.id.clone(), payload);
    let item = to_item(&auction)?;

    client
        .put_item()
        .table_name(AUCTION_TABLE)
        .set_item(Some(item))
        .send()
        .await?;

    Ok((StatusCode::CREATED, Json(auction)))
}

/// Get one of the seller's auctions by id.
#[utoipa::path(
    get,
    path = "/auctions/{auctionId}",
    tag = "Seller",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Returns the auction", body = Auction),
        (status = FORBIDDEN, description = "Not a seller or not the owner", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn seller_get_auction_by_id(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<Json<Auction>, HandlerError> {
    check_user(claim.as_claim(), UserRole::Seller)?;

    let client = Client::new(&state.aws_config);
    let auction = get_owned_auction(&client, auction_id, &claim.id).await?;

    Ok(Json(auction))
}

/// Edit a draft auction.
#[utoipa::path(
    patch,
    path = "/auctions/{auctionId}",
    tag = "Seller",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    request_body = UpdateAuctionRequest,
    responses(
        (status = OK, description = "Update success"),
        (status = BAD_REQUEST, description = "Bad update request or not a draft", body = HandlerError),
        (status = FORBIDDEN, description = "Not a seller or not the owner", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn seller_update_auction_by_id(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
    Json(payload): Json<UpdateAuctionRequest>,
) -> Result<(), HandlerError> {
    check_user(claim.as_claim(), UserRole::Seller)?;

    if payload == UpdateAuctionRequest::default() {
        return Err(HandlerError::InvalidState(
            "Must have at least 1 field to update.".to_string(),
        ));
    }
    payload.validate()?;

    let client = Client::new(&state.aws_config);
    let auction = get_owned_auction(&client, auction_id, &claim.id).await?;
    if auction.status != AuctionStatus::Draft {
        return Err(HandlerError::InvalidState(
            "Only draft auctions can be edited.".to_string(),
        ));
    }

    let mut update_expr: Vec<&str> = Vec::new();
    let mut eavs: HashMap<String, AttributeValue> = HashMap::new();

    eavs.insert(":draft".to_string(), AuctionStatus::Draft.into());

    if let Some(title) = payload.title {
        update_expr.push("title = :title");
        eavs.insert(":title".to_string(), AttributeValue::S(title));
    }

    if let Some(description) = payload.description {
        update_expr.push("description = :description");
        eavs.insert(":description".to_string(), AttributeValue::S(description));
    }

    if let Some(category) = payload.category {
        update_expr.push("category = :category");
        eavs.insert(":category".to_string(), AttributeValue::S(category));
    }

    if let Some(starting_price) = payload.starting_price {
        // currentBid tracks startingPrice until the auction goes active.
        update_expr.push("startingPrice = :starting_price");
        update_expr.push("currentBid = :starting_price");
        eavs.insert(
            ":starting_price".to_string(),
            AttributeValue::N(starting_price.to_string()),
        );
    }

    if let Some(reserve_price) = payload.reserve_price {
        update_expr.push("reservePrice = :reserve_price");
        eavs.insert(
            ":reserve_price".to_string(),
            AttributeValue::N(reserve_price.to_string()),
        );
    }

    if let Some(min_increment) = payload.min_increment {
        update_expr.push("minIncrement = :min_increment");
        eavs.insert(
            ":min_increment".to_string(),
            AttributeValue::N(min_increment.to_string()),
        );
    }

    if let Some(buy_now_price) = payload.buy_now_price {
        update_expr.push("buyNowPrice = :buy_now_price");
        eavs.insert(
            ":buy_now_price".to_string(),
            AttributeValue::N(buy_now_price.to_string()),
        );
    }

    if let Some(auction_length) = payload.auction_length {
        update_expr.push("auctionLength = :auction_length");
        eavs.insert(
            ":auction_length".to_string(),
            AttributeValue::N(auction_length.to_string()),
        );
    }

    if let Some(images) = payload.images {
        update_expr.push("images = :images");
        eavs.insert(":images".to_string(), to_attribute_value(images)?);
    }

    let result = client
        .update_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .update_expression(format!("SET {}", update_expr.join(", ")))
        .condition_expression("auctionStatus = :draft")
        .set_expression_attribute_values(Some(eavs))
        .send()
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e)
            if e.as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false) =>
        {
            Err(HandlerError::Conflict(
                "The auction left draft state while you were editing.".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Submit a draft for admin review (draft -> pending).
#[utoipa::path(
    post,
    path = "/auctions/{auctionId}/submit",
    tag = "Seller",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Submitted for review", body = PlainSuccessResponse),
        (status = BAD_REQUEST, description = "Not a draft", body = HandlerError),
        (status = FORBIDDEN, description = "Not a seller or not the owner", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn seller_submit_auction_by_id(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<PlainSuccessResponse, HandlerError> {
    check_user(claim.as_claim(), UserRole::Seller)?;

    let client = Client::new(&state.aws_config);
    let auction = get_owned_auction(&client, auction_id, &claim.id).await?;
    if auction.status != AuctionStatus::Draft {
        return Err(HandlerError::InvalidState(
            "Only draft auctions can be submitted.".to_string(),
        ));
    }

    client
        .update_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .update_expression("SET auctionStatus = :pending")
        .condition_expression("auctionStatus = :draft")
        .expression_attribute_values(":pending", AuctionStatus::Pending.into())
        .expression_attribute_values(":draft", AuctionStatus::Draft.into())
        .send()
        .await?;

    Ok(PlainSuccessResponse::ok("Auction submitted for review."))
}

/// Cancel an auction: drafts, pending listings, or active listings that
/// have not received a bid yet.
#[utoipa::path(
    post,
    path = "/auctions/{auctionId}/cancel",
    tag = "Seller",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Cancelled", body = PlainSuccessResponse),
        (status = FORBIDDEN, description = "Not a seller or not the owner", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = CONFLICT, description = "A bid or sale landed first", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn seller_cancel_auction_by_id(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<PlainSuccessResponse, HandlerError> {
    check_user(claim.as_claim(), UserRole::Seller)?;

    let client = Client::new(&state.aws_config);
    let now = now_millis();

    // Ownership check up front; cancellability is decided by the condition
    // so a bid racing this cancel cannot be orphaned.
    get_owned_auction(&client, auction_id, &claim.id).await?;

    let result = client
        .update_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .update_expression("SET auctionStatus = :cancelled, endedAt = :now")
        .condition_expression(
            "auctionStatus = :draft OR auctionStatus = :pending \
             OR (auctionStatus = :active AND attribute_not_exists(highestBidderId))",
        )
        .expression_attribute_values(":cancelled", AuctionStatus::Cancelled.into())
        .expression_attribute_values(":draft", AuctionStatus::Draft.into())
        .expression_attribute_values(":pending", AuctionStatus::Pending.into())
        .expression_attribute_values(":active", AuctionStatus::Active.into())
        .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
        .send()
        .await;

    match result {
        Ok(_) => Ok(PlainSuccessResponse::ok("Auction cancelled.")),
        Err(e)
            if e.as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false) =>
        {
            Err(HandlerError::Conflict(
                "The auction already has bids or has been finalized.".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}
