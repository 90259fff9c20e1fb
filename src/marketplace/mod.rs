//! Marketplace integration.
//!
//! Defines the `MarketplaceClient` trait the monitor depends on and the
//! JSON-over-HTTP implementation used in production. Every call takes the
//! session explicitly so the engine can be driven by an in-memory client
//! in tests.

pub mod http;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{AuthError, QueryError, UpdateError};
use crate::types::{Credentials, RawListing, Session};

/// Abstraction over the marketplace account, listing and pricing APIs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Log in and return a fresh session.
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// All current listings for a game/server pair.
    async fn list_sellers(
        &self,
        session: &Session,
        game_id: &str,
        server_id: &str,
    ) -> Result<Vec<RawListing>, QueryError>;

    /// Change the price of one of our own listings.
    async fn set_price(
        &self,
        session: &Session,
        listing_id: &str,
        new_price: Decimal,
    ) -> Result<(), UpdateError>;
}
