use serde::{Deserialize, Serialize};
use ulid::Ulid;
use utoipa::ToSchema;

/// One accepted bid. Append-only; the Ulid range key preserves creation
/// order within an auction's partition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    /// Target auction id, hash key
    pub auction_id: Ulid,
    /// Ulid, range key
    pub id: Ulid,
    /// Bidding buyer's user id
    pub bidder_id: String,
    /// Accepted amount
    pub amount: u64,
    /// Create time, in unix millis
    pub create_at: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidRequest {
    /// Target auction
    pub auction_id: Ulid,
    /// Proposed amount
    pub bid_amount: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuyNowRequest {
    /// Where to ship the item
    pub shipping_address: String,
    /// Opaque payment method token
    pub payment_method: String,
}

/// Result of a buy-now purchase.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Ulid, hash key
    pub id: Ulid,
    /// Purchased auction
    pub auction_id: Ulid,
    /// Purchasing buyer's user id
    pub buyer_id: String,
    /// Fixed price paid
    pub price: u64,
    /// Where to ship the item
    pub shipping_address: String,
    /// Opaque payment method token
    pub payment_method: String,
    /// Create time, in unix millis
    pub create_at: u64,
}

/// One favorite, keyed (userId, auctionId).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Owning user, hash key
    pub user_id: String,
    /// Favorited auction, range key
    pub auction_id: Ulid,
    /// Create time, in unix millis
    pub create_at: u64,
}
