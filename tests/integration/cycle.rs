//! End-to-end monitoring cycles.

use rust_decimal_macros::dec;
use secrecy::SecretString;
use std::collections::HashSet;

use undercut::engine::monitor::{MonitorSettings, PriceMonitor};
use undercut::types::{CycleOutcome, Credentials, PricingConfig, ProductScope};

use crate::mock_marketplace::{listing, Fault, MockMarketplace, RecordingNotifier};

const MY_LOT: &str = "lot-mine";

fn settings(whitelist: &[&str], min_price: rust_decimal::Decimal) -> MonitorSettings {
    MonitorSettings {
        scope: ProductScope { game_id: "41".into(), server_id: "2".into() },
        pricing: PricingConfig {
            self_listing_id: MY_LOT.into(),
            min_price,
            decrease_amount: dec!(1),
            whitelist: whitelist.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
        },
        credentials: Credentials {
            username: "seller".into(),
            password: SecretString::new("hunter2".into()),
        },
        currency: "₽".into(),
        check_interval_minutes: 10,
        dry_run: false,
    }
}

fn default_market() -> MockMarketplace {
    MockMarketplace::with_listings(vec![
        listing(MY_LOT, "500", "Me", dec!(100)),
        listing("lot-a", "501", "Alpha", dec!(90)),
        listing("lot-b", "502", "Bravo", dec!(50)),
    ])
}

fn monitor(
    market: &MockMarketplace,
    notifier: &RecordingNotifier,
    whitelist: &[&str],
) -> PriceMonitor {
    PriceMonitor::new(
        Box::new(market.clone()),
        Some(Box::new(notifier.clone())),
        settings(whitelist, dec!(0)),
    )
}

#[tokio::test]
async fn test_whitelisted_cheapest_is_ignored() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &["Bravo"]);

    let outcome = monitor.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::Updated(ref c) if c.new_price == dec!(89)));
    assert_eq!(market.updates(), vec![(MY_LOT.to_string(), dec!(89))]);
    assert_eq!(market.price_of(MY_LOT), Some(dec!(89)));

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Old price: 100₽"));
    assert!(messages[0].contains("New price: 89₽"));
    assert!(messages[0].contains("Alpha (90₽)"));
}

#[tokio::test]
async fn test_all_competitors_whitelisted() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &["501", "Bravo"]);

    assert_eq!(monitor.run_cycle().await, CycleOutcome::NoCompetitor);
    assert!(market.updates().is_empty());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_second_cycle_is_stable() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    assert!(matches!(monitor.run_cycle().await, CycleOutcome::Updated(_)));
    assert_eq!(market.price_of(MY_LOT), Some(dec!(49)));

    // We are now the cheapest; nothing to do.
    assert_eq!(
        monitor.run_cycle().await,
        CycleOutcome::AlreadyCheapest { my_price: dec!(49), competitor_price: dec!(50) }
    );
    assert_eq!(market.updates().len(), 1);
    assert_eq!(market.logins(), 1);
}

#[tokio::test]
async fn test_competitor_reprices_and_we_follow() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    monitor.run_cycle().await;
    market.reprice("lot-b", dec!(45));
    let outcome = monitor.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::Updated(ref c) if c.new_price == dec!(44)));
    assert_eq!(notifier.messages().len(), 2);
}

#[tokio::test]
async fn test_floor_price_respected() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut monitor = PriceMonitor::new(
        Box::new(market.clone()),
        Some(Box::new(notifier.clone())),
        settings(&[], dec!(60)),
    );

    match monitor.run_cycle().await {
        CycleOutcome::Updated(change) => {
            assert_eq!(change.new_price, dec!(60));
            assert!(change.clamped);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(notifier.messages()[0].contains("Clamped"));
}

#[tokio::test]
async fn test_own_listing_missing() {
    let market = MockMarketplace::with_listings(vec![listing("lot-a", "501", "Alpha", dec!(90))]);
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    assert_eq!(monitor.run_cycle().await, CycleOutcome::SelfMissing);
    assert!(market.updates().is_empty());
}

#[tokio::test]
async fn test_empty_market() {
    let market = MockMarketplace::with_listings(Vec::new());
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    assert_eq!(monitor.run_cycle().await, CycleOutcome::NoListings);
}

#[tokio::test]
async fn test_login_failure_then_recovery() {
    let market = default_market();
    market.set_fault(Fault::LoginRejected);
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    assert_eq!(monitor.run_cycle().await, CycleOutcome::AuthFailed);
    assert_eq!(market.queries(), 0);

    market.clear_faults();
    assert!(matches!(monitor.run_cycle().await, CycleOutcome::Updated(_)));
    assert_eq!(market.logins(), 2);
}

#[tokio::test]
async fn test_expired_session_relogin_next_cycle() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    market.set_fault(Fault::QuerySessionExpired);
    assert_eq!(monitor.run_cycle().await, CycleOutcome::NoListings);
    assert!(!monitor.has_session());

    market.clear_faults();
    assert!(matches!(monitor.run_cycle().await, CycleOutcome::Updated(_)));
    assert_eq!(market.logins(), 2);
}

#[tokio::test]
async fn test_query_failure_aborts_cycle() {
    let market = default_market();
    market.set_fault(Fault::QueryFails);
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    assert_eq!(monitor.run_cycle().await, CycleOutcome::NoListings);
    assert!(monitor.has_session());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_update_rejected_no_notification() {
    let market = default_market();
    market.set_fault(Fault::UpdateRejected);
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    assert_eq!(monitor.run_cycle().await, CycleOutcome::UpdateFailed);
    assert_eq!(market.price_of(MY_LOT), Some(dec!(100)));
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_update_session_expired_relogin() {
    let market = default_market();
    market.set_fault(Fault::UpdateSessionExpired);
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    assert_eq!(monitor.run_cycle().await, CycleOutcome::UpdateFailed);
    assert!(!monitor.has_session());

    market.clear_faults();
    assert!(matches!(monitor.run_cycle().await, CycleOutcome::Updated(_)));
}

#[tokio::test]
async fn test_notifier_failure_does_not_fail_cycle() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    notifier.set_failing(true);
    let mut monitor = monitor(&market, &notifier, &[]);

    assert!(matches!(monitor.run_cycle().await, CycleOutcome::Updated(_)));
    assert_eq!(market.price_of(MY_LOT), Some(dec!(49)));
}

#[tokio::test]
async fn test_without_notifier() {
    let market = default_market();
    let mut monitor = PriceMonitor::new(Box::new(market.clone()), None, settings(&[], dec!(0)));

    assert!(matches!(monitor.run_cycle().await, CycleOutcome::Updated(_)));
}

#[tokio::test]
async fn test_dry_run_leaves_market_untouched() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut cfg = settings(&[], dec!(0));
    cfg.dry_run = true;
    let mut monitor =
        PriceMonitor::new(Box::new(market.clone()), Some(Box::new(notifier.clone())), cfg);

    assert!(matches!(monitor.run_cycle().await, CycleOutcome::DryRun(_)));
    assert!(market.updates().is_empty());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_startup_login_and_notify() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &[]);

    monitor.login().await.unwrap();
    monitor.startup_notify().await;
    assert!(monitor.has_session());
    assert_eq!(notifier.messages().len(), 1);
    assert!(notifier.messages()[0].contains("game 41 / server 2"));

    // The startup session is reused by the first cycle.
    monitor.run_cycle().await;
    assert_eq!(market.logins(), 1);
}

#[test]
fn test_cycle_blocking_harness() {
    let market = default_market();
    let notifier = RecordingNotifier::default();
    let mut monitor = monitor(&market, &notifier, &["Bravo"]);

    let outcome = tokio_test::block_on(monitor.run_cycle());
    assert!(matches!(outcome, CycleOutcome::Updated(_)));
}
