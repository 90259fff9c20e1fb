//! Cycle orchestrator.
//!
//! `PriceMonitor` owns the marketplace session and runs one
//! login → snapshot → decide → update → notify pass per tick. Every
//! failure ends the cycle and leaves the monitor ready for the next tick;
//! nothing is retried within a cycle.

use rust_decimal::Decimal;
use std::time::Instant;
use tracing::{error, info, warn};

use super::pricing::{cheapest_eligible_competitor, decide, is_clamped, locate_self};
use super::snapshot::{snapshot_or_empty, try_read_snapshot};
use crate::error::{AuthError, QueryError, UpdateError};
use crate::marketplace::MarketplaceClient;
use crate::notify::{price_change_message, startup_message, Notifier};
use crate::types::{
    CycleOutcome, Credentials, Decision, PriceChange, PricingConfig, ProductScope, Session,
};

/// Static settings for a monitor, taken from the loaded config.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub scope: ProductScope,
    pub pricing: PricingConfig,
    pub credentials: Credentials,
    pub currency: String,
    pub check_interval_minutes: u64,
    pub dry_run: bool,
}

pub struct PriceMonitor {
    client: Box<dyn MarketplaceClient>,
    notifier: Option<Box<dyn Notifier>>,
    settings: MonitorSettings,
    session: Option<Session>,
    cycle_count: u64,
}

impl PriceMonitor {
    pub fn new(
        client: Box<dyn MarketplaceClient>,
        notifier: Option<Box<dyn Notifier>>,
        settings: MonitorSettings,
    ) -> Self {
        if notifier.is_none() {
            warn!("Telegram credentials not provided, notifications disabled");
        }
        Self {
            client,
            notifier,
            settings,
            session: None,
            cycle_count: 0,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Log in and keep the session, replacing any existing one.
    pub async fn login(&mut self) -> Result<(), AuthError> {
        let session = self.client.login(&self.settings.credentials).await?;
        info!(account = %session.account, "Logged in to marketplace");
        self.session = Some(session);
        Ok(())
    }

    /// Return the held session, logging in first if there is none.
    async fn ensure_session(&mut self) -> Result<Session, AuthError> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        self.login().await?;
        self.session
            .clone()
            .ok_or_else(|| AuthError::Malformed("session missing after login".into()))
    }

    /// Send the one-time startup message.
    pub async fn startup_notify(&self) {
        let msg = startup_message(
            &self.settings.scope.to_string(),
            self.settings.check_interval_minutes,
        );
        self.send_notification(&msg).await;
    }

    async fn send_notification(&self, message: &str) {
        let Some(notifier) = &self.notifier else {
            warn!("Notifications disabled, skipping");
            return;
        };
        match notifier.notify(message).await {
            Ok(()) => info!("Telegram notification sent"),
            Err(e) => error!(error = %e, "Failed to send Telegram notification"),
        }
    }

    /// Run one full check-and-undercut cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.cycle_count += 1;
        let started = Instant::now();
        info!(cycle = self.cycle_count, "Checking market prices...");

        let outcome = self.cycle_inner().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            cycle = self.cycle_count,
            elapsed_ms,
            outcome = %outcome,
            "Cycle complete"
        );
        outcome
    }

    async fn cycle_inner(&mut self) -> CycleOutcome {
        // 1. Session
        let session = match self.ensure_session().await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Failed to log in to marketplace, aborting price check");
                return CycleOutcome::AuthFailed;
            }
        };

        // 2. Snapshot
        let read = try_read_snapshot(&*self.client, &session, &self.settings.scope).await;
        if matches!(read, Err(QueryError::SessionExpired)) {
            self.session = None;
        }
        let snapshots = snapshot_or_empty(read);
        if snapshots.is_empty() {
            warn!("No sellers found or failed to get prices");
            return CycleOutcome::NoListings;
        }

        let pricing = &self.settings.pricing;

        // 3. Self
        let Some(me) = locate_self(&snapshots, &pricing.self_listing_id) else {
            warn!(lot_id = %pricing.self_listing_id, "My listing not found");
            return CycleOutcome::SelfMissing;
        };
        info!(price = %me.price, "My current price");

        // 4. Competitor
        let Some(competitor) =
            cheapest_eligible_competitor(&snapshots, &pricing.self_listing_id, &pricing.whitelist)
        else {
            info!("No competitors found (all other sellers are whitelisted)");
            return CycleOutcome::NoCompetitor;
        };
        info!(competitor = %competitor, "Cheapest competitor");

        // 5. Decision
        let new_price = match decide(
            me.price,
            competitor.price,
            pricing.decrease_amount,
            pricing.min_price,
        ) {
            Decision::NoAction => {
                info!("My price is already the cheapest, no action needed");
                return CycleOutcome::AlreadyCheapest {
                    my_price: me.price,
                    competitor_price: competitor.price,
                };
            }
            Decision::SetPrice { new_price } => new_price,
        };

        let clamped = is_clamped(competitor.price, pricing.decrease_amount, pricing.min_price);
        if clamped {
            let undercut_price = competitor.price - pricing.decrease_amount;
            warn!(
                undercut_price = %undercut_price,
                min_price = %pricing.min_price,
                "New price would be below minimum price, using the floor"
            );
        }
        if new_price >= me.price {
            warn!(
                new_price = %new_price,
                current = %me.price,
                "Floor price is not below the current price, updating anyway"
            );
        }

        let change = PriceChange {
            old_price: me.price,
            new_price,
            competitor: competitor.clone(),
            clamped,
        };

        // 6. Update
        if self.settings.dry_run {
            info!(old = %change.old_price, new = %new_price, "[DRY RUN] Would update price");
            return CycleOutcome::DryRun(change);
        }

        self.apply(&session, change).await
    }

    async fn apply(&mut self, session: &Session, change: PriceChange) -> CycleOutcome {
        let lot_id = self.settings.pricing.self_listing_id.clone();

        match self.client.set_price(session, &lot_id, change.new_price).await {
            Ok(()) => {
                info!(
                    price = %format_price(change.new_price, &self.settings.currency),
                    "Price updated"
                );
                let msg = price_change_message(&change, &self.settings.currency);
                self.send_notification(&msg).await;
                CycleOutcome::Updated(change)
            }
            Err(e) => {
                if matches!(e, UpdateError::SessionExpired) {
                    self.session = None;
                }
                error!(error = %e, "Failed to update price");
                CycleOutcome::UpdateFailed
            }
        }
    }
}

fn format_price(price: Decimal, currency: &str) -> String {
    format!("{}{currency}", price.normalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
