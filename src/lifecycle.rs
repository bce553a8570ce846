//! Auction completion sweep.
//!
//! Finds every auction still `active` past its `endTime` and finalizes it:
//! picks the highest bid, applies the reserve rule, stamps the winner, and
//! bumps the winner/seller statistics. Invoked on demand (admin route, cron
//! behind API Gateway); safe to re-run or race because every finalizing
//! write is conditioned on the row still being `active` and the scan filter
//! never returns an already-finalized auction.

use std::collections::HashMap;

use aws_sdk_dynamodb::{
    error::SdkError as DynamoSdkError,
    operation::transact_write_items::TransactWriteItemsError,
    types::{AttributeValue, TransactWriteItem, Update},
    Client,
};
use lambda_http::tracing;
use serde::{Deserialize, Serialize};
use serde_dynamo::from_items;
use ulid::Ulid;
use utoipa::ToSchema;

use crate::{
    constants::{AUCTION_TABLE, BID_TABLE, USER_TABLE},
    errors::HandlerError,
    models::{
        auction::{Auction, AuctionStatus},
        bid::Bid,
    },
};

/// What the sweep decided for one expired auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// No bids at all: unconditionally no winner, the reserve is never
    /// consulted.
    NoBids,
    /// Bids exist but the highest does not clear the reserve.
    ReserveNotMet { highest: u64 },
    /// Highest bid wins.
    Won { bidder_id: String, amount: u64 },
}

/// Pick the winning bid: maximum amount, earliest creation on ties.
/// Bids arrive in creation order (Ulid range key), so strict `>` keeps the
/// earliest of equal amounts.
pub fn highest_bid(bids: &[Bid]) -> Option<&Bid> {
    let mut best: Option<&Bid> = None;
    for bid in bids {
        match best {
            Some(b) if bid.amount > b.amount => best = Some(bid),
            None => best = Some(bid),
            _ => {}
        }
    }
    best
}

pub fn decide_outcome(reserve_price: Option<u64>, bids: &[Bid]) -> SweepOutcome {
    let Some(top) = highest_bid(bids) else {
        return SweepOutcome::NoBids;
    };
    match reserve_price {
        Some(reserve) if top.amount < reserve => SweepOutcome::ReserveNotMet {
            highest: top.amount,
        },
        _ => SweepOutcome::Won {
            bidder_id: top.bidder_id.clone(),
            amount: top.amount,
        },
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletedAuction {
    pub auction_id: Ulid,
    pub winner_id: Option<String>,
    pub winning_bid: Option<u64>,
    pub reserve_met: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepError {
    pub auction_id: Ulid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub message: String,
    pub processed_count: usize,
    pub completed_auctions: Vec<CompletedAuction>,
    pub errors: Vec<SweepError>,
}

/// True when a transaction was cancelled because a condition failed, i.e.
/// a racing writer finalized or outbid first.
pub fn transact_condition_failed(err: &DynamoSdkError<TransactWriteItemsError>) -> bool {
    match err.as_service_error() {
        Some(TransactWriteItemsError::TransactionCanceledException(c)) => c
            .cancellation_reasons()
            .iter()
            .any(|r| r.code() == Some("ConditionalCheckFailed")),
        _ => false,
    }
}

/// Run one sweep over all expired active auctions.
///
/// Failure isolation: an error finalizing one auction is recorded and the
/// rest are still processed. Only a failure of the initial scan aborts the
/// whole run.
pub async fn run_sweep(client: &Client, now: u64) -> Result<SweepReport, HandlerError> {
    let expired = scan_expired(client, now).await?;
    let processed_count = expired.len();

    let mut completed_auctions = Vec::new();
    let mut errors = Vec::new();
    for auction in expired {
        match finalize_auction(client, &auction, now).await {
            Ok(Some(completion)) => completed_auctions.push(completion),
            Ok(None) => {
                // A racing sweep or buy-now got there first; the condition
                // made this a no-op.
                tracing::info!("auction {} already finalized, skipping", auction.id);
            }
            Err(e) => {
                tracing::error!("failed to finalize auction {}: {}", auction.id, e);
                errors.push(SweepError {
                    auction_id: auction.id,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(SweepReport {
        message: format!("Processed {} expired auction(s).", processed_count),
        processed_count,
        completed_auctions,
        errors,
    })
}

async fn scan_expired(client: &Client, now: u64) -> Result<Vec<Auction>, HandlerError> {
    let mut items: Vec<HashMap<String, AttributeValue>> = Vec::new();
    let mut start_key: Option<HashMap<String, AttributeValue>> = None;
    loop {
        let resp = client
            .scan()
            .table_name(AUCTION_TABLE)
            .filter_expression("auctionStatus = :active AND endTime <= :now")
            .expression_attribute_values(":active", AuctionStatus::Active.into())
            .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
            .set_exclusive_start_key(start_key)
            .send()
            .await?;
        items.extend(resp.items().to_vec());
        start_key = resp.last_evaluated_key().cloned();
        if start_key.is_none() {
            break;
        }
    }
    Ok(from_items(items)?)
}

async fn load_bids(client: &Client, auction_id: Ulid) -> Result<Vec<Bid>, HandlerError> {
    let mut items: Vec<HashMap<String, AttributeValue>> = Vec::new();
    let mut start_key: Option<HashMap<String, AttributeValue>> = None;
    loop {
        let resp = client
            .query()
            .table_name(BID_TABLE)
            .key_condition_expression("auctionId = :aid")
            .expression_attribute_values(":aid", AttributeValue::S(auction_id.to_string()))
            .set_exclusive_start_key(start_key)
            .send()
            .await?;
        items.extend(resp.items().to_vec());
        start_key = resp.last_evaluated_key().cloned();
        if start_key.is_none() {
            break;
        }
    }
    Ok(from_items(items)?)
}

/// Finalize one expired auction. Returns `Ok(None)` when the conditional
/// write found the auction no longer `active`.
async fn finalize_auction(
    client: &Client,
    auction: &Auction,
    now: u64,
) -> Result<Option<CompletedAuction>, HandlerError> {
    let bids = load_bids(client, auction.id).await?;

    match decide_outcome(auction.reserve_price, &bids) {
        SweepOutcome::Won { bidder_id, amount } => {
            finalize_with_winner(client, auction, &bidder_id, amount, now).await
        }
        // Both no-winner outcomes report reserveMet = false: the auction
        // did not succeed.
        _ => finalize_without_winner(client, auction, now).await,
    }
}

async fn finalize_with_winner(
    client: &Client,
    auction: &Auction,
    winner_id: &str,
    winning_bid: u64,
    now: u64,
) -> Result<Option<CompletedAuction>, HandlerError> {
    let auction_update = TransactWriteItem::builder()
        .update(
            Update::builder()
                .table_name(AUCTION_TABLE)
                .key("id", AttributeValue::S(auction.id.to_string()))
                .update_expression(
                    "SET auctionStatus = :ended, winnerId = :winner, \
                     winningBid = :amount, endedAt = :now",
                )
                .condition_expression("auctionStatus = :active")
                .expression_attribute_values(":ended", AuctionStatus::Ended.into())
                .expression_attribute_values(":active", AuctionStatus::Active.into())
                .expression_attribute_values(":winner", AttributeValue::S(winner_id.to_string()))
                .expression_attribute_values(":amount", AttributeValue::N(winning_bid.to_string()))
                .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
                .build()?,
        )
        .build();

    // Stats ride the same transaction so a crash cannot separate "auction
    // ended with winner X" from "X won one more auction".
    let winner_update = TransactWriteItem::builder()
        .update(
            Update::builder()
                .table_name(USER_TABLE)
                .key("id", AttributeValue::S(winner_id.to_string()))
                .update_expression("ADD winCount :one")
                .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
                .build()?,
        )
        .build();

    let seller_update = TransactWriteItem::builder()
        .update(
            Update::builder()
                .table_name(USER_TABLE)
                .key("id", AttributeValue::S(auction.seller_id.clone()))
                .update_expression("ADD saleCount :one")
                .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
                .build()?,
        )
        .build();

    let result = client
        .transact_write_items()
        .transact_items(auction_update)
        .transact_items(winner_update)
        .transact_items(seller_update)
        .send()
        .await;

    match result {
        Ok(_) => Ok(Some(CompletedAuction {
            auction_id: auction.id,
            winner_id: Some(winner_id.to_string()),
            winning_bid: Some(winning_bid),
            reserve_met: true,
        })),
        Err(e) if transact_condition_failed(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn finalize_without_winner(
    client: &Client,
    auction: &Auction,
    now: u64,
) -> Result<Option<CompletedAuction>, HandlerError> {
    let result = client
        .update_item()
        .table_name(AUCTION_TABLE)
        .key("id", AttributeValue::S(auction.id.to_string()))
        .update_expression("SET auctionStatus = :ended, endedAt = :now")
        .condition_expression("auctionStatus = :active")
        .expression_attribute_values(":ended", AuctionStatus::Ended.into())
        .expression_attribute_values(":active", AuctionStatus::Active.into())
        .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
        .send()
        .await;

    match result {
        Ok(_) => Ok(Some(CompletedAuction {
            auction_id: auction.id,
            winner_id: None,
            winning_bid: None,
            reserve_met: false,
        })),
        Err(e)
            if e.as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false) =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::now_millis;

    fn bid(bidder: &str, amount: u64) -> Bid {
        Bid {
            auction_id: Ulid::new(),
            id: Ulid::new(),
            bidder_id: bidder.to_string(),
            amount,
            create_at: now_millis(),
        }
    }

    #[test]
    fn no_bids_means_no_winner_regardless_of_reserve() {
        assert_eq!(decide_outcome(None, &[]), SweepOutcome::NoBids);
        assert_eq!(decide_outcome(Some(1_000), &[]), SweepOutcome::NoBids);
    }

    #[test]
    fn reserve_not_met_even_with_bids() {
        let bids = vec![bid("buyer_a", 400), bid("buyer_b", 525)];
        assert_eq!(
            decide_outcome(Some(1_000), &bids),
            SweepOutcome::ReserveNotMet { highest: 525 }
        );
    }

    #[test]
    fn highest_bid_wins_without_reserve() {
        let bids = vec![bid("buyer_a", 850), bid("buyer_b", 600)];
        assert_eq!(
            decide_outcome(None, &bids),
            SweepOutcome::Won {
                bidder_id: "buyer_a".to_string(),
                amount: 850
            }
        );
    }

    #[test]
    fn reserve_exactly_met_wins() {
        let bids = vec![bid("buyer_a", 1_000)];
        assert_eq!(
            decide_outcome(Some(1_000), &bids),
            SweepOutcome::Won {
                bidder_id: "buyer_a".to_string(),
                amount: 1_000
            }
        );
    }

    #[test]
    fn amount_tie_goes_to_earliest_bid() {
        // Bids are stored in creation order; the first of equal amounts wins.
        let bids = vec![bid("buyer_first", 700), bid("buyer_second", 700)];
        let top = highest_bid(&bids).unwrap();
        assert_eq!(top.bidder_id, "buyer_first");
    }
}
