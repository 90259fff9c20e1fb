//! Operator notifications.
//!
//! Defines the `Notifier` trait and the Telegram Bot API implementation.
//! Delivery is best effort: callers log failures and carry on.

pub mod telegram;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::types::PriceChange;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Message sent after our price was changed.
pub fn price_change_message(change: &PriceChange, currency: &str) -> String {
    // A floor above our current price raises it instead.
    let header = if change.new_price < change.old_price {
        "✅ Price lowered!"
    } else {
        "⚠️ Price updated"
    };
    let mut msg = format!(
        "{header}\n\
         Old price: {}{currency}\n\
         New price: {}{currency}\n\
         Undercut: {} ({}{currency})",
        change.old_price.normalize(),
        change.new_price.normalize(),
        change.competitor.seller_name,
        change.competitor.price.normalize(),
    );
    if change.clamped {
        msg.push_str("\n⚠️ Clamped to the floor price");
    }
    msg
}

/// Message sent once when the monitor starts.
pub fn startup_message(scope: &str, interval_minutes: u64) -> String {
    format!("🚀 Price monitor started for {scope}, checking every {interval_minutes} min")
}
