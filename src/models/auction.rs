use core::fmt;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use utoipa::ToSchema;

use crate::errors::HandlerError;

/// Auction lifecycle state.
///
/// `draft -> pending -> active -> ended | sold`, with `cancelled` reachable
/// from `draft`, `pending`, and bid-less `active`. Every transition out of
/// `active` is a conditional write gated on the row still being `active`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Draft,
    Pending,
    Active,
    Ended,
    Sold,
    Cancelled,
}

impl From<AuctionStatus> for AttributeValue {
    fn from(value: AuctionStatus) -> Self {
        AttributeValue::S(value.to_string())
    }
}

impl Default for AuctionStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let out = match *self {
            AuctionStatus::Draft => "draft",
            AuctionStatus::Pending => "pending",
            AuctionStatus::Active => "active",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Sold => "sold",
            AuctionStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", out)
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    /// Ulid, hash key
    pub id: Ulid,
    /// Consigning seller's user id, immutable
    pub seller_id: String,
    /// Create time, in unix millis
    pub create_at: u64,
    /// Listing title
    pub title: String,
    /// Listing description
    pub description: String,
    /// Browse category
    pub category: String,
    /// Opaque image keys
    pub images: Vec<String>,
    /// Immutable floor price, > 0
    pub starting_price: u64,
    /// Highest accepted amount; starts at `startingPrice`, non-decreasing.
    /// The conditional bid update is the only writer once active.
    pub current_bid: u64,
    /// Auction succeeds only if the final bid clears this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_price: Option<u64>,
    /// Minimum delta over `currentBid` for the next bid, > 0
    pub min_increment: u64,
    /// Fixed price for immediate purchase, if offered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_now_price: Option<u64>,
    /// Auction run length in millis; stamps `endTime` at approval
    pub auction_length: u64,
    /// `status` is a DynamoDB reserved word, stored as `auctionStatus`
    #[serde(rename = "auctionStatus")]
    pub status: AuctionStatus,
    /// Unix millis, set at approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    /// Unix millis, set at approval; required while active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
    /// Updated by every accepted bid; absent until the first one, which is
    /// what lets bid-less cancellation use `attribute_not_exists`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_bidder_id: Option<String>,
    /// Set once by the completion sweep, only when the reserve was met
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_bid: Option<u64>,
    /// Unix millis, set when the sweep finalizes the auction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<u64>,
    /// Buy-now outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_at: Option<u64>,
}

impl Auction {
    /// Largest accepted price field, in cents. Bounding every price keeps
    /// `currentBid + minIncrement` far inside `u64` for the life of the row.
    pub const MAX_AMOUNT: u64 = 1_000_000_000_000;
    /// Longest run length, 365 days in millis; bounds
    /// `startTime + auctionLength` stamped at approval.
    pub const MAX_AUCTION_LENGTH: u64 = 365 * 24 * 60 * 60 * 1000;

    pub fn new_from_request(seller_id: String, req: CreateAuctionRequest) -> Self {
        Self {
            id: Ulid::new(),
            seller_id,
            create_at: crate::utils::now_millis(),
            title: req.title,
            description: req.description,
            category: req.category,
            images: req.images,
            starting_price: req.starting_price,
            // One monotonic rule for the whole life of the auction: the
            // first bid must clear startingPrice + minIncrement.
            current_bid: req.starting_price,
            reserve_price: req.reserve_price,
            min_increment: req.min_increment,
            buy_now_price: req.buy_now_price,
            auction_length: req.auction_length,
            ..Default::default()
        }
    }

    /// Smallest amount the next bid must reach. Saturates so a row with
    /// out-of-range price data rejects every bid instead of wrapping the
    /// minimum below `currentBid`.
    pub fn minimum_bid(&self) -> u64 {
        self.current_bid.saturating_add(self.min_increment)
    }

    /// Validate a proposed bid against this snapshot of the auction.
    ///
    /// Check order matches the rejection contract: status, window, amount.
    /// Passing here is necessary but not sufficient; the write itself is
    /// conditioned on the committed row so a stale snapshot cannot admit a
    /// lost update.
    pub fn check_bid(&self, amount: u64, now: u64) -> Result<(), HandlerError> {
        if self.status != AuctionStatus::Active {
            return Err(HandlerError::InvalidState(format!(
                "Cannot bid on a {} auction.",
                self.status
            )));
        }
        if let Some(start) = self.start_time {
            if now < start {
                return Err(HandlerError::InvalidState(
                    "Auction has not started yet.".to_string(),
                ));
            }
        }
        match self.end_time {
            Some(end) if now <= end => {}
            _ => {
                return Err(HandlerError::InvalidState(
                    "Auction has already ended.".to_string(),
                ))
            }
        }
        let minimum = self.minimum_bid();
        if amount < minimum {
            return Err(HandlerError::BidTooLow { minimum });
        }
        Ok(())
    }

    /// Validate a buy-now purchase and return the fixed price.
    pub fn check_buy_now(&self, now: u64) -> Result<u64, HandlerError> {
        if self.status != AuctionStatus::Active {
            return Err(HandlerError::InvalidState(format!(
                "Cannot purchase a {} auction.",
                self.status
            )));
        }
        if let Some(start) = self.start_time {
            if now < start {
                return Err(HandlerError::InvalidState(
                    "Auction has not started yet.".to_string(),
                ));
            }
        }
        match self.end_time {
            Some(end) if now <= end => {}
            _ => {
                return Err(HandlerError::InvalidState(
                    "Auction has already ended.".to_string(),
                ))
            }
        }
        self.buy_now_price.ok_or_else(|| {
            HandlerError::InvalidState("This auction has no buy-now price.".to_string())
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionRequest {
    /// Listing title
    pub title: String,
    /// Listing description
    pub description: String,
    /// Browse category
    pub category: String,
    /// Floor price, > 0
    pub starting_price: u64,
    /// Optional reserve
    #[serde(default)]
    pub reserve_price: Option<u64>,
    /// Minimum bid delta, > 0
    pub min_increment: u64,
    /// Optional fixed buy-now price
    #[serde(default)]
    pub buy_now_price: Option<u64>,
    /// Auction run length in millis
    pub auction_length: u64,
    /// Opaque image keys
    #[serde(default)]
    pub images: Vec<String>,
}

impl CreateAuctionRequest {
    /// Reject zero or out-of-range pricing before anything is written.
    pub fn validate(&self) -> Result<(), HandlerError> {
        if self.starting_price == 0 || self.min_increment == 0 || self.auction_length == 0 {
            return Err(HandlerError::InvalidState(
                "startingPrice, minIncrement and auctionLength must be positive.".to_string(),
            ));
        }
        let amounts = [
            Some(self.starting_price),
            Some(self.min_increment),
            self.reserve_price,
            self.buy_now_price,
        ];
        if amounts
            .into_iter()
            .flatten()
            .any(|v| v > Auction::MAX_AMOUNT)
        {
            return Err(HandlerError::InvalidState(format!(
                "Price fields must not exceed {}.",
                Auction::MAX_AMOUNT
            )));
        }
        if self.auction_length > Auction::MAX_AUCTION_LENGTH {
            return Err(HandlerError::InvalidState(format!(
                "auctionLength must not exceed {} ms.",
                Auction::MAX_AUCTION_LENGTH
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuctionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub starting_price: Option<u64>,
    pub reserve_price: Option<u64>,
    pub min_increment: Option<u64>,
    pub buy_now_price: Option<u64>,
    pub auction_length: Option<u64>,
    pub images: Option<Vec<String>>,
}

impl UpdateAuctionRequest {
    /// Same bounds as creation, applied per supplied field.
    pub fn validate(&self) -> Result<(), HandlerError> {
        if self.starting_price == Some(0)
            || self.min_increment == Some(0)
            || self.auction_length == Some(0)
        {
            return Err(HandlerError::InvalidState(
                "startingPrice, minIncrement and auctionLength must be positive.".to_string(),
            ));
        }
        let amounts = [
            self.starting_price,
            self.min_increment,
            self.reserve_price,
            self.buy_now_price,
        ];
        if amounts
            .into_iter()
            .flatten()
            .any(|v| v > Auction::MAX_AMOUNT)
        {
            return Err(HandlerError::InvalidState(format!(
                "Price fields must not exceed {}.",
                Auction::MAX_AMOUNT
            )));
        }
        if self
            .auction_length
            .is_some_and(|v| v > Auction::MAX_AUCTION_LENGTH)
        {
            return Err(HandlerError::InvalidState(format!(
                "auctionLength must not exceed {} ms.",
                Auction::MAX_AUCTION_LENGTH
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_auction() -> Auction {
        Auction {
            id: Ulid::new(),
            seller_id: "seller_test".to_string(),
            title: "Test lot".to_string(),
            starting_price: 500,
            current_bid: 500,
            min_increment: 25,
            auction_length: 60_000,
            status: AuctionStatus::Active,
            start_time: Some(1_000),
            end_time: Some(61_000),
            ..Default::default()
        }
    }

    #[test]
    fn first_bid_must_clear_start_plus_increment() {
        let auction = active_auction();
        // startingPrice=500, minIncrement=25: 500 is too low, 525 clears.
        match auction.check_bid(500, 2_000) {
            Err(HandlerError::BidTooLow { minimum }) => assert_eq!(minimum, 525),
            other => panic!("expected BidTooLow, got {:?}", other),
        }
        assert!(auction.check_bid(525, 2_000).is_ok());
    }

    #[test]
    fn bid_below_current_plus_increment_rejected() {
        let mut auction = active_auction();
        auction.current_bid = 850;
        auction.highest_bidder_id = Some("buyer_x".to_string());
        match auction.check_bid(860, 2_000) {
            Err(HandlerError::BidTooLow { minimum }) => assert_eq!(minimum, 875),
            other => panic!("expected BidTooLow, got {:?}", other),
        }
        assert!(auction.check_bid(875, 2_000).is_ok());
    }

    #[test]
    fn bid_rejected_for_every_non_active_status() {
        for status in [
            AuctionStatus::Draft,
            AuctionStatus::Pending,
            AuctionStatus::Ended,
            AuctionStatus::Sold,
            AuctionStatus::Cancelled,
        ] {
            let mut auction = active_auction();
            auction.status = status;
            assert!(
                matches!(
                    auction.check_bid(10_000, 2_000),
                    Err(HandlerError::InvalidState(_))
                ),
                "status {} accepted a bid",
                status
            );
        }
    }

    #[test]
    fn bid_rejected_outside_window() {
        let auction = active_auction();
        // Before startTime.
        assert!(matches!(
            auction.check_bid(10_000, 500),
            Err(HandlerError::InvalidState(_))
        ));
        // After endTime.
        assert!(matches!(
            auction.check_bid(10_000, 62_000),
            Err(HandlerError::InvalidState(_))
        ));
        // endTime itself is inclusive.
        assert!(auction.check_bid(525, 61_000).is_ok());
    }

    #[test]
    fn status_check_precedes_amount_check() {
        let mut auction = active_auction();
        auction.status = AuctionStatus::Ended;
        // Too-low amount on an ended auction reports the state, not the price.
        assert!(matches!(
            auction.check_bid(1, 2_000),
            Err(HandlerError::InvalidState(_))
        ));
    }

    #[test]
    fn oversized_current_bid_cannot_wrap_the_minimum() {
        // A row carrying a price near u64::MAX must reject every bid, not
        // wrap the minimum around to a tiny number a 100-cent bid clears.
        let mut auction = active_auction();
        auction.starting_price = u64::MAX;
        auction.current_bid = u64::MAX;
        assert_eq!(auction.minimum_bid(), u64::MAX);
        match auction.check_bid(100, 2_000) {
            Err(HandlerError::BidTooLow { minimum }) => assert_eq!(minimum, u64::MAX),
            other => panic!("expected BidTooLow, got {:?}", other),
        }
    }

    fn create_request() -> CreateAuctionRequest {
        CreateAuctionRequest {
            title: "Test lot".to_string(),
            description: String::new(),
            category: "misc".to_string(),
            starting_price: 500,
            reserve_price: None,
            min_increment: 25,
            buy_now_price: None,
            auction_length: 60_000,
            images: Vec::new(),
        }
    }

    #[test]
    fn consignment_rejects_zero_and_oversized_inputs() {
        assert!(create_request().validate().is_ok());

        let mut req = create_request();
        req.starting_price = 0;
        assert!(matches!(
            req.validate(),
            Err(HandlerError::InvalidState(_))
        ));

        let mut req = create_request();
        req.starting_price = u64::MAX;
        assert!(matches!(
            req.validate(),
            Err(HandlerError::InvalidState(_))
        ));

        let mut req = create_request();
        req.buy_now_price = Some(Auction::MAX_AMOUNT + 1);
        assert!(matches!(
            req.validate(),
            Err(HandlerError::InvalidState(_))
        ));

        let mut req = create_request();
        req.auction_length = Auction::MAX_AUCTION_LENGTH + 1;
        assert!(matches!(
            req.validate(),
            Err(HandlerError::InvalidState(_))
        ));

        let mut req = create_request();
        req.starting_price = Auction::MAX_AMOUNT;
        req.auction_length = Auction::MAX_AUCTION_LENGTH;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn edit_rejects_oversized_inputs_per_field() {
        // An empty edit is caught by the route, not by validation.
        assert!(UpdateAuctionRequest::default().validate().is_ok());

        let req = UpdateAuctionRequest {
            min_increment: Some(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            req.validate(),
            Err(HandlerError::InvalidState(_))
        ));

        let req = UpdateAuctionRequest {
            auction_length: Some(Auction::MAX_AUCTION_LENGTH + 1),
            ..Default::default()
        };
        assert!(matches!(
            req.validate(),
            Err(HandlerError::InvalidState(_))
        ));
    }

    #[test]
    fn buy_now_requires_price_and_active_window() {
        let mut auction = active_auction();
        assert!(matches!(
            auction.check_buy_now(2_000),
            Err(HandlerError::InvalidState(_))
        ));

        auction.buy_now_price = Some(2_000);
        assert_eq!(auction.check_buy_now(2_000).unwrap(), 2_000);

        auction.status = AuctionStatus::Sold;
        assert!(matches!(
            auction.check_buy_now(2_000),
            Err(HandlerError::InvalidState(_))
        ));
    }
}
