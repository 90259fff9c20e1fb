//! JSON-over-HTTP marketplace client.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST /auth/login` (form `username`, `password`) returns a session token
//! - `GET  /games/{game_id}/servers/{server_id}/lots` lists every seller's lot
//! - `POST /lots/{lot_id}/price` (JSON `{"price": ...}`) changes our price
//!
//! Auth: `Authorization: Bearer {session_token}` on every call after login.
//! HTTP 401/403 mean the session has expired; the caller drops it and logs
//! in again on the next cycle.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::MarketplaceClient;
use crate::error::{AuthError, QueryError, UpdateError};
use crate::types::{Credentials, RawListing, Session};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const USER_AGENT: &str = "UNDERCUT/0.1.0 (listing-price-monitor)";
const LOGIN_SUCCESS: &str = "SUCCESS";

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct PriceUpdateRequest {
    price: Decimal,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct HttpMarketplaceClient {
    http: Client,
    base_url: String,
}

impl HttpMarketplaceClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for marketplace")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn lots_url(&self, game_id: &str, server_id: &str) -> String {
        format!(
            "{}/games/{}/servers/{}/lots",
            self.base_url,
            urlencoding::encode(game_id),
            urlencoding::encode(server_id),
        )
    }

    fn price_url(&self, listing_id: &str) -> String {
        format!("{}/lots/{}/price", self.base_url, urlencoding::encode(listing_id))
    }

    fn is_session_expired(status: StatusCode) -> bool {
        status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
    }

    /// Turn a login response into a session, or explain why not.
    fn session_from_login(account: &str, login: LoginResponse) -> Result<Session, AuthError> {
        let status = login.status.as_deref().unwrap_or(LOGIN_SUCCESS);
        if status != LOGIN_SUCCESS {
            return Err(AuthError::Rejected(status.to_string()));
        }
        let token = login
            .session_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AuthError::Malformed("login succeeded but no session token returned".into())
            })?;

        Ok(Session {
            account: account.to_string(),
            token: SecretString::new(token),
        })
    }
}

#[async_trait]
impl MarketplaceClient for HttpMarketplaceClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if credentials.username.is_empty() || credentials.password.expose_secret().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        info!(account = %credentials.username, "Authenticating with marketplace...");

        let resp = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .header("Accept", "application/json")
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.expose_secret().as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(format!("{status}: {body}")));
        }

        let login: LoginResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;

        let session = Self::session_from_login(&credentials.username, login)?;
        info!(account = %session.account, "Marketplace authentication successful");
        Ok(session)
    }

    async fn list_sellers(
        &self,
        session: &Session,
        game_id: &str,
        server_id: &str,
    ) -> Result<Vec<RawListing>, QueryError> {
        let url = self.lots_url(game_id, server_id);
        debug!(url = %url, "Fetching marketplace lots");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(session.token.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if Self::is_session_expired(status) {
            return Err(QueryError::SessionExpired);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QueryError::Status { status: status.as_u16(), body });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| QueryError::Parse(e.to_string()))
    }

    async fn set_price(
        &self,
        session: &Session,
        listing_id: &str,
        new_price: Decimal,
    ) -> Result<(), UpdateError> {
        let url = self.price_url(listing_id);
        debug!(url = %url, price = %new_price, "Updating lot price");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(session.token.expose_secret())
            .json(&PriceUpdateRequest { price: new_price })
            .send()
            .await?;

        let status = resp.status();
        if Self::is_session_expired(status) {
            return Err(UpdateError::SessionExpired);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpdateError::Rejected { status: status.as_u16(), body });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
