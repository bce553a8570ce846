/// Auction listings, hash key `id`.
pub const AUCTION_TABLE: &str = "auctra-auctions";
/// GSI on [`AUCTION_TABLE`] for per-seller queries, hash key `sellerId`.
pub const AUCTION_SELLER_INDEX: &str = "sellerId-index";
/// Bids, hash key `auctionId`, range key `id` (Ulid, creation-ordered).
pub const BID_TABLE: &str = "auctra-bids";
/// Buy-now orders, hash key `id`.
pub const ORDER_TABLE: &str = "auctra-orders";
/// Users of every role, hash key `id`.
pub const USER_TABLE: &str = "auctra-users";
/// Favorites, hash key `userId`, range key `auctionId`.
pub const FAVORITE_TABLE: &str = "auctra-favorites";

/// JWT audience checked by the auth middleware.
pub const JWT_AUDIENCE: &str = "auctra";
