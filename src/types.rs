//! Shared types for the UNDERCUT monitor.
//!
//! These types form the data model used across all modules. The
//! marketplace client produces `RawListing`s, the snapshot reader turns
//! them into `ListingSnapshot`s, and the pricing engine reduces a
//! snapshot to a `Decision`.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// A single listing as the marketplace returns it.
///
/// Seller and listing ids come back as strings on some endpoints and as
/// bare numbers on others, so both are normalised to `String` here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawListing {
    #[serde(rename = "id", deserialize_with = "string_or_number")]
    pub listing_id: String,
    #[serde(rename = "user_id", deserialize_with = "string_or_number")]
    pub seller_id: String,
    #[serde(rename = "user_name", default)]
    pub seller_name: String,
    pub price: Decimal,
}

/// One seller's listing for the monitored product, rebuilt every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSnapshot {
    pub seller_id: String,
    pub seller_name: String,
    pub listing_id: String,
    pub price: Decimal,
}

impl From<RawListing> for ListingSnapshot {
    fn from(raw: RawListing) -> Self {
        Self {
            seller_id: raw.seller_id,
            seller_name: raw.seller_name,
            listing_id: raw.listing_id,
            price: raw.price,
        }
    }
}

impl fmt::Display for ListingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (seller {}, lot {}) @ {}",
            self.seller_name, self.seller_id, self.listing_id, self.price
        )
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Uint(n) => n.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Product scope / session
// ---------------------------------------------------------------------------

/// Which product the monitor watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductScope {
    pub game_id: String,
    pub server_id: String,
}

impl ProductScope {
    pub fn is_empty(&self) -> bool {
        self.game_id.trim().is_empty() || self.server_id.trim().is_empty()
    }
}

impl fmt::Display for ProductScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game {} / server {}", self.game_id, self.server_id)
    }
}

/// Marketplace login credentials, resolved from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// An authenticated marketplace session.
///
/// Owned by the monitor and lent to every query/update call. Dropped
/// when the marketplace reports it expired; the next cycle logs in again.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: String,
    pub token: SecretString,
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Pricing parameters, built once at startup from the loaded config.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub self_listing_id: String,
    pub min_price: Decimal,
    pub decrease_amount: Decimal,
    /// Seller ids and/or seller names that are never treated as competition.
    pub whitelist: HashSet<String>,
}

/// What to do with our own listing after looking at the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Already cheapest or tied.
    NoAction,
    SetPrice { new_price: Decimal },
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::NoAction => write!(f, "no action"),
            Decision::SetPrice { new_price } => write!(f, "set price to {new_price}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// A price change that was applied (or would have been, in dry-run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceChange {
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub competitor: ListingSnapshot,
    /// The undercut price fell below the floor and was raised to it.
    pub clamped: bool,
}

/// How a single monitoring cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    AuthFailed,
    NoListings,
    SelfMissing,
    NoCompetitor,
    AlreadyCheapest {
        my_price: Decimal,
        competitor_price: Decimal,
    },
    Updated(PriceChange),
    DryRun(PriceChange),
    UpdateFailed,
}

impl CycleOutcome {
    /// Whether the cycle ended early because something was missing or failed.
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            CycleOutcome::AuthFailed
                | CycleOutcome::NoListings
                | CycleOutcome::SelfMissing
                | CycleOutcome::NoCompetitor
                | CycleOutcome::UpdateFailed
        )
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::AuthFailed => write!(f, "aborted: login failed"),
            CycleOutcome::NoListings => write!(f, "aborted: no listings"),
            CycleOutcome::SelfMissing => write!(f, "aborted: own listing not found"),
            CycleOutcome::NoCompetitor => write!(f, "aborted: no eligible competitor"),
            CycleOutcome::AlreadyCheapest { my_price, competitor_price } => {
                write!(f, "already cheapest ({my_price} <= {competitor_price})")
            }
            CycleOutcome::Updated(c) => write!(f, "updated {} -> {}", c.old_price, c.new_price),
            CycleOutcome::DryRun(c) => {
                write!(f, "dry run {} -> {}", c.old_price, c.new_price)
            }
            CycleOutcome::UpdateFailed => write!(f, "aborted: price update failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
