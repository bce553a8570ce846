use std::sync::Arc;

use aws_sdk_dynamodb::{
    types::{AttributeValue, ReturnValue},
    Client,
};
use axum::{
    extract::{Json, Path, State},
    Extension,
};
use serde_dynamo::{from_item, from_items};
use ulid::Ulid;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    constants::AUCTION_TABLE,
    errors::HandlerError,
    lifecycle::{self, SweepReport},
    models::{
        auction::{Auction, AuctionStatus},
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
        .routes(routes!(admin_get_auctions))
        .routes(routes!(admin_delete_auction_by_id))
        .routes(routes!(admin_approve_auction_by_id))
        .routes(routes!(admin_run_sweep))
}

/// All auctions regardless of status.
#[utoipa::path(
    get,
    path = "/auctions",
    tag = "Admin",
    responses(
        (status = OK, description = "All auctions", body = Vec<Auction>),
        (status = FORBIDDEN, description = "Not an admin", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn admin_get_auctions(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Auction>>, HandlerError> {
    check_user(claim.as_claim(), UserRole::Admin)?;

    let client = Client::new(&state.aws_config);

    let scan_resp = client.scan().table_name(AUCTION_TABLE).send().await?;
    let auctions: Vec<Auction> = from_items(scan_resp.items().to_vec())?;

    Ok(Json(auctions))
}

/// Hard-delete an auction. The only path that physically removes one.
#[utoipa::path(
    delete,
    path = "/auctions/{auctionId}",
    tag = "Admin",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Deleted", body = PlainSuccessResponse),
        (status = FORBIDDEN, description = "Not an admin", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn admin_delete_auction_by_id(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<PlainSuccessResponse, HandlerError> {
    check_user(claim.as_claim(), UserRole::Admin)?;

    let client = Client::new(&state.aws_config);

    let delete_resp = client
        .delete_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .return_values(ReturnValue::AllOld)
        .send()
        .await?;

    if delete_resp.attributes().is_none() {
        Err(HandlerError::auction_not_found())
    } else {
        Ok(PlainSuccessResponse::ok("Auction deleted."))
    }
}

/// Approve a pending listing: stamps the bidding window and goes active.
#[utoipa::path(
    post,
    path = "/auctions/{auctionId}/approve",
    tag = "Admin",
    params(
        ("auctionId" = String, Path, description = "Auction ID", format = Ulid),
    ),
    responses(
        (status = OK, description = "Approved", body = Auction),
        (status = BAD_REQUEST, description = "Not pending", body = HandlerError),
        (status = FORBIDDEN, description = "Not an admin", body = HandlerError),
        (status = NOT_FOUND, description = "Auction not found", body = HandlerError),
        (status = CONFLICT, description = "Raced another transition", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Handler errors", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn admin_approve_auction_by_id(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<Ulid>,
) -> Result<Json<Auction>, HandlerError> {
    check_user(claim.as_claim(), UserRole::Admin)?;

    let client = Client::new(&state.aws_config);

    let get_resp = client
        .get_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .send()
        .await?;
    let item = get_resp.item.ok_or(HandlerError::auction_not_found())?;
    let auction: Auction = from_item(item)?;

    if auction.status != AuctionStatus::Pending {
        return Err(HandlerError::InvalidState(
            "Only pending auctions can be approved.".to_string(),
        ));
    }

    let start_time = now_millis();
    let end_time = start_time.checked_add(auction.auction_length).ok_or_else(|| {
        HandlerError::InvalidState("auctionLength overflows the bidding window.".to_string())
    })?;

    let result = client
        .update_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction_id.to_string()))
        .update_expression(
            "SET auctionStatus = :active, startTime = :start, endTime = :end",
        )
        .condition_expression("auctionStatus = :pending")
        .expression_attribute_values(":active", AuctionStatus::Active.into())
        .expression_attribute_values(":pending", AuctionStatus::Pending.into())
        .expression_attribute_values(":start", AttributeValue::N(start_time.to_string()))
        .expression_attribute_values(":end", AttributeValue::N(end_time.to_string()))
        .return_values(ReturnValue::AllNew)
        .send()
        .await;

    match result {
        Ok(resp) => {
            let item = resp
                .attributes
                .ok_or_else(|| HandlerError::Internal("update returned no item".to_string()))?;
            Ok(Json(from_item(item)?))
        }
        Err(e)
            if e.as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false) =>
        {
            Err(HandlerError::Conflict(
                "The auction left pending state first.".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Finalize every expired active auction. Idempotent; per-auction failures
/// are reported in the body, not as an HTTP error.
#[utoipa::path(
    post,
    path = "/sweep",
    tag = "Admin",
    responses(
        (status = OK, description = "Sweep report", body = SweepReport),
        (status = FORBIDDEN, description = "Not an admin", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Sweep could not start", body = HandlerError),
    ),
    security(
        ("http-jwt" = []),
    ),
)]
async fn admin_run_sweep(
    Extension(claim): Extension<ClaimOwned>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SweepReport>, HandlerError> {
    check_user(claim.as_claim(), UserRole::Admin)?;

    let client = Client::new(&state.aws_config);
    let report = lifecycle::run_sweep(&client, now_millis()).await?;

    Ok(Json(report))
}
