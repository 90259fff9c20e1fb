//! Undercut pricing rules.
//!
//! Pure functions over an explicit snapshot slice and config values. No
//! state is kept between calls, so the same inputs always give the same
//! answer.

use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::types::{Decision, ListingSnapshot};

/// Our own listing, if it is currently visible on the market.
pub fn locate_self<'a>(
    snapshots: &'a [ListingSnapshot],
    self_listing_id: &str,
) -> Option<&'a ListingSnapshot> {
    snapshots.iter().find(|s| s.listing_id == self_listing_id)
}

/// The cheapest listing that is neither ours nor whitelisted.
///
/// Whitelist entries match either the seller id or the seller name. Ties
/// go to the listing that comes first in `snapshots`.
pub fn cheapest_eligible_competitor<'a>(
    snapshots: &'a [ListingSnapshot],
    self_listing_id: &str,
    whitelist: &HashSet<String>,
) -> Option<&'a ListingSnapshot> {
    snapshots
        .iter()
        .filter(|s| s.listing_id != self_listing_id)
        .filter(|s| !whitelist.contains(&s.seller_id) && !whitelist.contains(&s.seller_name))
        .fold(None, |cheapest: Option<&ListingSnapshot>, s| match cheapest {
            Some(c) if c.price <= s.price => Some(c),
            _ => Some(s),
        })
}

/// Compute the undercut price against a single competitor.
///
/// A tie is not undercut. The result is never below `min_price`, even
/// when that leaves it at or above the competitor (or our current price).
pub fn decide(
    my_price: Decimal,
    competitor_price: Decimal,
    decrease_amount: Decimal,
    min_price: Decimal,
) -> Decision {
    if my_price <= competitor_price {
        return Decision::NoAction;
    }

    let new_price = (competitor_price - decrease_amount).max(min_price);
    Decision::SetPrice { new_price }
}

/// Whether the undercut target fell below the floor and was raised to it.
pub fn is_clamped(competitor_price: Decimal, decrease_amount: Decimal, min_price: Decimal) -> bool {
    competitor_price - decrease_amount < min_price
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
