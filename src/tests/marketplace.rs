//! End-to-end marketplace tests. These need a local DynamoDB (see
//! `AppState::test`) with the tables from `constants` created, so they are
//! ignored by default.

use std::sync::Arc;

use aws_sdk_dynamodb::{types::AttributeValue, Client};
use axum::http::StatusCode;
use lambda_http::{tower::ServiceExt, Error};
use serde_dynamo::{from_item, to_item};
use ulid::Ulid;

use crate::{
    constants::{AUCTION_TABLE, BID_TABLE},
    create_service,
    lifecycle,
    models::{
        auction::{Auction, AuctionStatus},
        bid::Bid,
        user::UserRole,
        ErrorResponse,
    },
    state::AppState,
    tests::{build_request, make_token, parse_resp, test_state},
    utils::{create_userid, now_millis},
};

async fn seed_auction(client: &Client, auction: &Auction) -> Result<(), Error> {
    client
        .put_item()
        .table_name(AUCTION_TABLE)
        .set_item(Some(to_item(auction)?))
        .send()
        .await?;
    Ok(())
}

async fn get_auction(client: &Client, id: Ulid) -> Result<Auction, Error> {
    let resp = client
        .get_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(id.to_string()))
        .send()
        .await?;
    Ok(from_item(resp.item.expect("auction should exist"))?)
}

async fn clean_auction(client: &Client, id: Ulid) -> Result<(), Error> {
    client
        .delete_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(id.to_string()))
        .send()
        .await?;
    Ok(())
}

fn active_auction(seller_id: &str, now: u64) -> Auction {
    Auction {
        id: Ulid::new(),
        seller_id: seller_id.to_string(),
        create_at: now,
        title: format!("Test lot {}", Ulid::new()),
        category: "test".to_string(),
        starting_price: 500,
        current_bid: 500,
        min_increment: 25,
        auction_length: 60_000,
        status: AuctionStatus::Active,
        start_time: Some(now - 1_000),
        end_time: Some(now + 60_000),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires a local DynamoDB at localhost:8000"]
async fn test_bid_rejected_then_accepted() -> Result<(), Error> {
    let state = test_state().await?;
    let client = Client::new(&state.aws_config);
    let now = now_millis();

    let auction = active_auction("seller_bidflow", now);
    seed_auction(&client, &auction).await?;

    let token = make_token(&state, "bidder@test.org", UserRole::Buyer)?;

    // startingPrice=500, minIncrement=25: a bid of 500 is too low.
    let body = serde_json::json!({
        "auctionId": auction.id.to_string(),
        "bidAmount": 500,
    });
    let service = create_service(state.clone()).await?;
    let resp = service
        .oneshot(build_request("POST", "/v1/bids", &token, Some(body))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorResponse = parse_resp(resp).await?;
    assert!(err.message.contains("525"), "message: {}", err.message);

    // 525 clears the floor.
    let body = serde_json::json!({
        "auctionId": auction.id.to_string(),
        "bidAmount": 525,
    });
    let service = create_service(state.clone()).await?;
    let resp = service
        .oneshot(build_request("POST", "/v1/bids", &token, Some(body))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bid: Bid = parse_resp(resp).await?;
    assert_eq!(bid.amount, 525);

    let stored = get_auction(&client, auction.id).await?;
    assert_eq!(stored.current_bid, 525);
    assert_eq!(stored.highest_bidder_id.as_deref(), Some(bid.bidder_id.as_str()));

    client
        .delete_item()
        .table_name(BID_TABLE)
        .key("auctionId", AttributeValue::S(bid.auction_id.to_string()))
        .key("id", AttributeValue::S(bid.id.to_string()))
        .send()
        .await?;
    clean_auction(&client, auction.id).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a local DynamoDB at localhost:8000"]
async fn test_buy_now_second_purchase_conflicts() -> Result<(), Error> {
    let state = test_state().await?;
    let client = Client::new(&state.aws_config);
    let now = now_millis();

    let mut auction = active_auction("seller_buynow", now);
    auction.buy_now_price = Some(2_000);
    seed_auction(&client, &auction).await?;

    let token = make_token(&state, "purchaser@test.org", UserRole::Buyer)?;
    let body = serde_json::json!({
        "shippingAddress": "1 Test Street",
        "paymentMethod": "tok_test",
    });

    let uri = format!("/v1/auctions/{}/buy-now", auction.id);

    let service = create_service(state.clone()).await?;
    let resp = service
        .oneshot(build_request("POST", &uri, &token, Some(body.clone()))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // The auction is now sold; the condition makes the rerun fail.
    let service = create_service(state.clone()).await?;
    let resp = service
        .oneshot(build_request("POST", &uri, &token, Some(body))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let stored = get_auction(&client, auction.id).await?;
    assert_eq!(stored.status, AuctionStatus::Sold);
    assert_eq!(stored.sold_price, Some(2_000));

    clean_auction(&client, auction.id).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a local DynamoDB at localhost:8000"]
async fn test_sweep_finalizes_and_is_idempotent() -> Result<(), Error> {
    let state = test_state().await?;
    let client = Client::new(&state.aws_config);
    let now = now_millis();

    // Expired with a bid over its (absent) reserve: wins.
    let mut won = active_auction("seller_sweep", now - 120_000);
    won.end_time = Some(now - 1_000);
    won.current_bid = 850;
    let bidder = create_userid("sweep-bidder@test.org", UserRole::Buyer);
    won.highest_bidder_id = Some(bidder.clone());
    seed_auction(&client, &won).await?;
    let bid = Bid {
        auction_id: won.id,
        id: Ulid::new(),
        bidder_id: bidder.clone(),
        amount: 850,
        create_at: now - 2_000,
    };
    client
        .put_item()
        .table_name(BID_TABLE)
        .set_item(Some(to_item(&bid)?))
        .send()
        .await?;

    // Expired with a reserve nothing cleared: ends without a winner.
    let mut reserved = active_auction("seller_sweep", now - 120_000);
    reserved.end_time = Some(now - 1_000);
    reserved.reserve_price = Some(10_000);
    seed_auction(&client, &reserved).await?;

    let report = lifecycle::run_sweep(&client, now).await?;
    assert_eq!(report.processed_count, 2);
    assert!(report.errors.is_empty());

    let won_completion = report
        .completed_auctions
        .iter()
        .find(|c| c.auction_id == won.id)
        .expect("won auction should be completed");
    assert_eq!(won_completion.winner_id.as_deref(), Some(bidder.as_str()));
    assert_eq!(won_completion.winning_bid, Some(850));
    assert!(won_completion.reserve_met);

    let reserved_completion = report
        .completed_auctions
        .iter()
        .find(|c| c.auction_id == reserved.id)
        .expect("reserved auction should be completed");
    assert_eq!(reserved_completion.winner_id, None);
    assert!(!reserved_completion.reserve_met);

    // Second run finds nothing to do.
    let report = lifecycle::run_sweep(&client, now_millis()).await?;
    assert_eq!(report.processed_count, 0);
    assert!(report.completed_auctions.is_empty());

    client
        .delete_item()
        .table_name(BID_TABLE)
        .key("auctionId", AttributeValue::S(bid.auction_id.to_string()))
        .key("id", AttributeValue::S(bid.id.to_string()))
        .send()
        .await?;
    clean_auction(&client, won.id).await?;
    clean_auction(&client, reserved.id).await?;
    Ok(())
}
