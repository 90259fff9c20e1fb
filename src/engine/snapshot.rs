//! Market snapshot reader.
//!
//! Queries the marketplace for every listing of the monitored product and
//! normalises the result into `ListingSnapshot`s. Listings keep the order
//! the marketplace returned them in, which is what the tie-break in
//! `pricing::cheapest_eligible_competitor` relies on.

use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::QueryError;
use crate::marketplace::MarketplaceClient;
use crate::types::{ListingSnapshot, ProductScope, RawListing, Session};

/// Fetch the current snapshot, surfacing query errors.
pub async fn try_read_snapshot(
    client: &dyn MarketplaceClient,
    session: &Session,
    scope: &ProductScope,
) -> Result<Vec<ListingSnapshot>, QueryError> {
    if scope.is_empty() {
        warn!("Product scope is empty, skipping market query");
        return Ok(Vec::new());
    }

    let raw = client
        .list_sellers(session, &scope.game_id, &scope.server_id)
        .await?;
    let snapshots = normalise(raw);

    info!(sellers = snapshots.len(), scope = %scope, "Market snapshot fetched");
    Ok(snapshots)
}

/// Fetch the current snapshot. Any failure yields an empty snapshot.
pub async fn read_snapshot(
    client: &dyn MarketplaceClient,
    session: &Session,
    scope: &ProductScope,
) -> Vec<ListingSnapshot> {
    snapshot_or_empty(try_read_snapshot(client, session, scope).await)
}

/// Log a failed read and treat it as an empty market.
pub fn snapshot_or_empty(
    result: Result<Vec<ListingSnapshot>, QueryError>,
) -> Vec<ListingSnapshot> {
    match result {
        Ok(snapshots) => snapshots,
        Err(e) => {
            warn!(error = %e, "Failed to get market prices");
            Vec::new()
        }
    }
}

/// Drop malformed entries and later duplicates of a listing id.
fn normalise(raw: Vec<RawListing>) -> Vec<ListingSnapshot> {
    let mut seen = HashSet::new();
    let mut snapshots = Vec::with_capacity(raw.len());

    for listing in raw {
        if listing.price < Decimal::ZERO {
            debug!(listing_id = %listing.listing_id, price = %listing.price, "Skipping negative price");
            continue;
        }
        if !seen.insert(listing.listing_id.clone()) {
            debug!(listing_id = %listing.listing_id, "Skipping duplicate listing");
            continue;
        }
        snapshots.push(ListingSnapshot::from(listing));
    }

    snapshots
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
