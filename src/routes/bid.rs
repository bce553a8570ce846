use std::sync::Arc;

use aws_sdk_dynamodb::{
    types::{AttributeValue, Put, TransactWriteItem, Update},
    Client,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    Extension,
};
use serde_dynamo::{from_item, to_item};
use ulid::Ulid;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    constants::{AUCTION_TABLE, BID_TABLE, ORDER_TABLE},
    errors::HandlerError,
    lifecycle::transact_condition_failed,
    models::{
        auction::{Auction, AuctionStatus},
        auth::ClaimOwned,
        bid::{Bid, BuyNowRequest, Order, PlaceBidRequest},
        user::UserRole,
    },
    state::AppState,
    utils::now_millis,
};

use super::check_user;

pub fn router() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(place_bid))
        .routes(routes!(buy_now))
}

async fn get_auction(client: &Client, auction_id: Ulid) -> Result<Auction, HandlerError> {
    let get_resp = client
        .get_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .send()
        .await?;

    let item = get_resp.item.ok_or(HandlerError::auction_not_found())?;
    Ok(from_item(item)?)
}

/// Place a bid on an active auction.
///
/// The snapshot read only produces the user-facing rejection; acceptance is
/// decided by the conditional transaction, so two racing bids serialize on
/// `currentBid` and a lower bid can never overwrite a higher one.
#[utoipa::path(
    post,
    path = "/bids",
    tag = "Bid",
    request_body = PlaceBidRequest,
    responses(
        (status = CREATED, description = "Bid accepted", body = Bid),
        (status = BAD_REQUEST, description = "Auction not biddable or bid too low", body = HandlerError),
        (status = FORBIDDEN, description = "Not a buyer", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = CONFLICT, description = "Outbid by a racing bidder", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn place_bid(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlaceBidRequest>,
) -> Result<(StatusCode, Json<Bid>), HandlerError> {
    check_user(claim.as_claim(), UserRole::Buyer)?;

    let client = Client::new(&state.aws_config);
    let auction = get_auction(&client, payload.auction_id).await?;

    let now = now_millis();
    auction.check_bid(payload.bid_amount, now)?;

    let bid = Bid {
        auction_id: auction.id,
        id: Ulid::new(),
        bidder_id: claim.id.clone(),
        amount: payload.bid_amount,
        create_at: now,
    };

    // Condition expressions cannot do arithmetic, so the increment rule
    // `amount >= currentBid + minIncrement` is phrased against the
    // committed row as `currentBid <= amount - minIncrement`. check_bid
    // already guarantees amount >= minIncrement; the checked form keeps an
    // out-of-range row from wrapping the floor.
    let floor = payload
        .bid_amount
        .checked_sub(auction.min_increment)
        .ok_or(HandlerError::BidTooLow {
            minimum: auction.minimum_bid(),
        })?;

    let bid_put = TransactWriteItem::builder()
        .put(
            Put::builder()
                .table_name(BID_TABLE)
                .set_item(Some(to_item(&bid)?))
                .build()?,
        )
        .build();

    let auction_update = TransactWriteItem::builder()
        .update(
            Update::builder()
                .table_name(AUCTION_TABLE)
                .key("id", AttributeValue::S(auction.id.to_string()))
                .update_expression("SET currentBid = :amount, highestBidderId = :bidder")
                .condition_expression("auctionStatus = :active AND currentBid <= :floor")
                .expression_attribute_values(
                    ":amount",
                    AttributeValue::N(payload.bid_amount.to_string()),
                )
                .expression_attribute_values(":bidder", AttributeValue::S(claim.id.clone()))
                .expression_attribute_values(":active", AuctionStatus::Active.into())
                .expression_attribute_values(":floor", AttributeValue::N(floor.to_string()))
                .build()?,
        )
        .build();

    let result = client
        .transact_write_items()
        .transact_items(bid_put)
        .transact_items(auction_update)
        .send()
        .await;

    match result {
        Ok(_) => Ok((StatusCode::CREATED, Json(bid))),
        Err(e) if transact_condition_failed(&e) => Err(HandlerError::Conflict(
            "A higher bid was accepted first. Refresh and bid again.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Purchase an active auction outright at its fixed buy-now price.
#[utoipa::path(
    post,
    path = "/auctions/{auctionId}/buy-now",
    tag = "Bid",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    request_body = BuyNowRequest,
    responses(
        (status = CREATED, description = "Purchase complete", body = Order),
        (status = BAD_REQUEST, description = "Auction not purchasable", body = HandlerError),
        (status = FORBIDDEN, description = "Not a buyer", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = CONFLICT, description = "Already sold to a racing buyer", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn buy_now(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
    Json(payload): Json<BuyNowRequest>,
) -> Result<(StatusCode, Json<Order>), HandlerError> {
    check_user(claim.as_claim(), UserRole::Buyer)?;

    let client = Client::new(&state.aws_config);
    let auction = get_auction(&client, auction_id).await?;

    let now = now_millis();
    let price = auction.check_buy_now(now)?;

    let order = Order {
        id: Ulid::new(),
        auction_id,
        buyer_id: claim.id.clone(),
        price,
        shipping_address: payload.shipping_address,
        payment_method: payload.payment_method,
        create_at: now,
    };

    let order_put = TransactWriteItem::builder()
        .put(
            Put::builder()
                .table_name(ORDER_TABLE)
                .set_item(Some(to_item(&order)?))
                .build()?,
        )
        .build();

    // Exactly one of any number of racing purchases flips active -> sold.
    let auction_update = TransactWriteItem::builder()
        .update(
            Update::builder()
                .table_name(AUCTION_TABLE)
                .key("id", AttributeValue::S(auction_id.to_string()))
                .update_expression(
                    "SET auctionStatus = :sold, soldTo = :buyer, \
                     soldPrice = :price, soldAt = :now",
                )
                .condition_expression("auctionStatus = :active")
                .expression_attribute_values(":sold", AuctionStatus::Sold.into())
                .expression_attribute_values(":active", AuctionStatus::Active.into())
                .expression_attribute_values(":buyer", AttributeValue::S(claim.id.clone()))
                .expression_attribute_values(":price", AttributeValue::N(price.to_string()))
                .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
                .build()?,
        )
        .build();

    let result = client
        .transact_write_items()
        .transact_items(order_put)
        .transact_items(auction_update)
        .send()
        .await;

    match result {
        Ok(_) => Ok((StatusCode::CREATED, Json(order))),
        Err(e) if transact_condition_failed(&e) => Err(HandlerError::Conflict(
            "This item is no longer available.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}
