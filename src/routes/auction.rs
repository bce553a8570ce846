use std::{collections::HashMap, sync::Arc};

use aws_sdk_dynamodb::{types::AttributeValue, Client};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_dynamo::{from_item, from_items};
use ulid::Ulid;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    constants::{AUCTION_TABLE, BID_TABLE},
    errors::HandlerError,
    models::{
        auction::{Auction, AuctionStatus},
        bid::Bid,
    },
    state::AppState,
};

pub fn router() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(browse_auctions))
        .routes(routes!(get_auction))
        .routes(routes!(get_auction_bids))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
struct BrowseQuery {
    /// Restrict to one category.
    category: Option<String>,
    /// Substring match over the title.
    q: Option<String>,
}

/// Browse active auctions, optionally filtered by category or title search.
#[utoipa::path(
    get,
    path = "/",
    tag = "Auction",
    params(BrowseQuery),
    responses(
        (status = OK, description = "Active auctions", body = Vec<Auction>),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
)]
async fn browse_auctions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<Vec<Auction>>, HandlerError> {
    let client = Client::new(&state.aws_config);

    let mut filter: Vec<&str> = vec!["auctionStatus = :active"];
    let mut eavs: HashMap<String, AttributeValue> = HashMap::new();
    eavs.insert(":active".to_string(), AuctionStatus::Active.into());

    if let Some(category) = query.category {
        filter.push("category = :category");
        eavs.insert(":category".to_string(), AttributeValue::S(category));
    }
    if let Some(q) = query.q {
        filter.push("contains(title, :q)");
        eavs.insert(":q".to_string(), AttributeValue::S(q));
    }

    let scan_resp = client
        .scan()
        .table_name(AUCTION_TABLE)
        .filter_expression(filter.join(" AND "))
        .set_expression_attribute_values(Some(eavs))
        .send()
        .await?;

    let result = from_items(scan_resp.items().to_vec())?;

    Ok(Json(result))
}

/// Get one auction by id, any status.
#[utoipa::path(
    get,
    path = "/{auctionId}",
    tag = "Auction",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Returns the auction", body = Auction),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
)]
async fn get_auction(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<Json<Auction>, HandlerError> {
    let client = Client::new(&state.aws_config);

    let get_resp = client
        .get_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .send()
        .await?;

    let item = get_resp.item.ok_or(HandlerError::auction_not_found())?;
    let result = from_item(item)?;

    Ok(Json(result))
}

/// Bid history for an auction, newest first.
#[utoipa::path(
    get,
    path = "/{auctionId}/bids",
    tag = "Auction",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Bid history", body = Vec<Bid>),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
)]
async fn get_auction_bids(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<Json<Vec<Bid>>, HandlerError> {
    let client = Client::new(&state.aws_config);

    let query_resp = client
        .query()
        .table_name(BID_TABLE)
        .key_condition_expression("auctionId = :aid")
        .expression_attribute_values(":aid", AttributeValue::S(auction_id.to_string()))
        .scan_index_forward(false)
        .send()
        .await?;

    let result = from_items(query_resp.items().to_vec())?;

    Ok(Json(result))
}
