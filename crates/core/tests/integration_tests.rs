// ═══════════════════════════════════════════════════════════════════
// Integration Tests — PortfolioTracker end to end
// ═══════════════════════════════════════════════════════════════════

mod common;

use common::{at, btc, market, sample, FlakyStore, ScriptedSource};
use crypto_portfolio_core::errors::CoreError;
use crypto_portfolio_core::models::selection::{AlertTrigger, PriceAlert, SelectedAsset, Selection};
use crypto_portfolio_core::models::settings::Settings;
use crypto_portfolio_core::services::market_service::QueryStatus;
use crypto_portfolio_core::storage::kv::{KeyValueStore, MemoryStore};
use crypto_portfolio_core::storage::selection_store::{encode, USER_ASSETS_KEY};
use crypto_portfolio_core::PortfolioTracker;

fn tracker() -> PortfolioTracker<ScriptedSource, MemoryStore> {
    PortfolioTracker::new(Settings::default(), ScriptedSource::new(market()), MemoryStore::new())
}

fn stored(pairs: &[(&str, f64)]) -> MemoryStore {
    let selection = Selection::from_entries(
        pairs
            .iter()
            .map(|(id, q)| SelectedAsset::new(*id, *q))
            .collect(),
    );
    let mut store = MemoryStore::new();
    store
        .set(USER_ASSETS_KEY, &encode(&selection).unwrap())
        .unwrap();
    store
}

fn stored_selection<S: KeyValueStore>(tracker: &PortfolioTracker<ScriptedSource, S>) -> Selection {
    tracker.store().try_load().unwrap().unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════
// Startup
// ═══════════════════════════════════════════════════════════════════

mod startup {
    use super::*;

    #[test]
    fn empty_store_gives_empty_selection() {
        let t = tracker();
        assert!(t.selection().is_empty());
        assert!(!t.has_unsaved_changes());
        assert_eq!(t.market_status(), &QueryStatus::Idle);
    }

    #[test]
    fn loads_persisted_selection() {
        let t = PortfolioTracker::new(
            Settings::default(),
            ScriptedSource::new(market()),
            stored(&[("BTC", 2.0), ("ETH", 1.5)]),
        );
        assert_eq!(t.selection().len(), 2);
        assert_eq!(t.selection().quantity_of("ETH"), 1.5);
    }

    #[test]
    fn unreadable_store_starts_empty() {
        let backend = FlakyStore {
            fail_reads: true,
            ..FlakyStore::default()
        };
        let t = PortfolioTracker::new(Settings::default(), ScriptedSource::new(market()), backend);
        assert!(t.selection().is_empty());
    }

    #[test]
    fn corrupt_document_starts_empty() {
        let mut backend = MemoryStore::new();
        backend.set(USER_ASSETS_KEY, "{not json").unwrap();
        let t = PortfolioTracker::new(Settings::default(), ScriptedSource::new(market()), backend);
        assert!(t.selection().is_empty());
    }

    #[test]
    fn with_coinapi_rejects_invalid_settings() {
        let settings = Settings {
            api_url: "ftp://example.com".into(),
            ..Settings::default()
        };
        let err = PortfolioTracker::with_coinapi(settings, MemoryStore::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn with_coinapi_accepts_defaults() {
        assert!(PortfolioTracker::with_coinapi(Settings::default(), MemoryStore::new()).is_ok());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Editing Session
// ═══════════════════════════════════════════════════════════════════

mod editing {
    use super::*;

    #[test]
    fn edits_stay_in_memory_until_saved() {
        let mut t = tracker();
        t.update_quantity("BTC", "2.5");
        assert!(t.has_unsaved_changes());
        assert_eq!(t.selection().quantity_of("BTC"), 2.5);
        assert!(stored_selection(&t).is_empty());

        assert!(t.save_selection());
        assert!(!t.has_unsaved_changes());
        assert_eq!(stored_selection(&t).quantity_of("BTC"), 2.5);
    }

    #[test]
    fn cancel_discards_edits() {
        let mut t = PortfolioTracker::new(
            Settings::default(),
            ScriptedSource::new(market()),
            stored(&[("BTC", 1.0)]),
        );
        t.increment_quantity("BTC");
        t.update_quantity("ETH", "4");
        assert_eq!(t.selection().quantity_of("BTC"), 2.0);

        t.cancel_edits();
        assert!(!t.has_unsaved_changes());
        assert_eq!(t.selection().quantity_of("BTC"), 1.0);
        assert!(!t.selection().contains("ETH"));
    }

    #[test]
    fn zero_text_removes_holding() {
        let mut t = PortfolioTracker::new(
            Settings::default(),
            ScriptedSource::new(market()),
            stored(&[("BTC", 1.0), ("ETH", 1.0)]),
        );
        t.update_quantity("BTC", "0");
        assert!(t.save_selection());
        let persisted = stored_selection(&t);
        assert!(!persisted.contains("BTC"));
        assert!(persisted.contains("ETH"));
    }

    #[test]
    fn decrement_to_zero_removes_holding() {
        let mut t = tracker();
        t.increment_quantity("ETH");
        t.decrement_quantity("ETH");
        assert!(!t.selection().contains("ETH"));
    }

    #[test]
    fn failed_save_reports_false_and_stays_dirty() {
        let backend = FlakyStore {
            fail_writes: true,
            ..FlakyStore::default()
        };
        let mut t = PortfolioTracker::new(Settings::default(), ScriptedSource::new(market()), backend);
        t.update_quantity("BTC", "1");
        assert!(!t.save_selection());
        assert!(t.has_unsaved_changes());
        assert_eq!(t.selection().quantity_of("BTC"), 1.0);
    }

    #[test]
    fn reload_picks_up_external_writes() {
        let mut t = tracker();
        let doc = encode(&Selection::from_entries(vec![SelectedAsset::new("ETH", 7.0)])).unwrap();
        t.store_mut().backend_mut().set(USER_ASSETS_KEY, &doc).unwrap();
        t.reload_selection();
        assert_eq!(t.selection().quantity_of("ETH"), 7.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Price Alerts
// ═══════════════════════════════════════════════════════════════════

mod alerts {
    use super::*;

    #[test]
    fn save_price_alert_persists_immediately() {
        let mut t = tracker();
        t.update_quantity("BTC", "1");
        t.save_price_alert("BTC", PriceAlert::new(Some(60_000.0), Some(40_000.0)))
            .unwrap();

        assert!(!t.has_unsaved_changes());
        let persisted = stored_selection(&t);
        let alert = persisted.get("BTC").unwrap().price_alert.clone().unwrap();
        assert_eq!(alert.above_price, Some(60_000.0));
        assert_eq!(alert.below_price, Some(40_000.0));
    }

    #[test]
    fn alert_on_unheld_asset_is_rejected() {
        let mut t = tracker();
        let err = t
            .save_price_alert("BTC", PriceAlert::new(Some(1.0), None))
            .unwrap_err();
        assert!(matches!(err, CoreError::AssetNotFound(_)));
        assert!(stored_selection(&t).is_empty());
    }

    #[test]
    fn storage_failure_surfaces_and_keeps_memory_unchanged() {
        let backend = FlakyStore {
            fail_writes: true,
            ..FlakyStore::default()
        };
        let mut t = PortfolioTracker::new(Settings::default(), ScriptedSource::new(market()), backend);
        t.update_quantity("BTC", "1");

        let err = t
            .save_price_alert("BTC", PriceAlert::new(Some(60_000.0), None))
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
        assert!(t.selection().get("BTC").unwrap().price_alert.is_none());
        assert!(t.has_unsaved_changes());
    }

    #[test]
    fn saving_an_alert_commits_pending_quantity_edits() {
        let mut t = PortfolioTracker::new(
            Settings::default(),
            ScriptedSource::new(market()),
            stored(&[("BTC", 1.0)]),
        );
        t.update_quantity("BTC", "5");
        t.update_quantity("ETH", "2");
        t.save_price_alert("BTC", PriceAlert::new(Some(60_000.0), None))
            .unwrap();

        let persisted = stored_selection(&t);
        assert_eq!(persisted.quantity_of("BTC"), 5.0);
        assert_eq!(persisted.quantity_of("ETH"), 2.0);

        t.cancel_edits();
        assert_eq!(t.selection().quantity_of("BTC"), 5.0);
        assert!(t.selection().contains("ETH"));
    }

    #[test]
    fn clearing_an_alert() {
        let mut t = tracker();
        t.update_quantity("BTC", "1");
        t.save_price_alert("BTC", PriceAlert::new(Some(60_000.0), None))
            .unwrap();
        t.save_price_alert("BTC", PriceAlert::default()).unwrap();
        assert!(stored_selection(&t).get("BTC").unwrap().price_alert.is_none());
    }

    #[tokio::test]
    async fn triggered_alerts_after_refresh() {
        let mut t = tracker();
        t.update_quantity("BTC", "1");
        t.save_price_alert("BTC", PriceAlert::new(None, Some(55_000.0)))
            .unwrap();
        assert!(t.triggered_alerts().is_empty());

        t.refresh_assets(false).await.unwrap();
        let alerts = t.triggered_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].trigger, AlertTrigger::Below(55_000.0));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Holdings, Value, Market Data
// ═══════════════════════════════════════════════════════════════════

mod market_views {
    use super::*;

    #[test]
    fn value_is_zero_before_first_fetch() {
        let t = PortfolioTracker::new(
            Settings::default(),
            ScriptedSource::new(market()),
            stored(&[("BTC", 30.0)]),
        );
        assert_eq!(t.portfolio_value(), 0.0);
        assert_eq!(t.portfolio_value_display(), "0.00");
        assert!(t.holdings().is_empty());
        assert!(t.selectable_assets().is_empty());
    }

    #[tokio::test]
    async fn value_after_refresh() {
        let mut t = PortfolioTracker::new(
            Settings::default(),
            ScriptedSource::new(market()),
            stored(&[("BTC", 30.0)]),
        );
        t.refresh_assets(false).await.unwrap();
        assert_eq!(t.portfolio_value(), 1_500_000.0);
        assert_eq!(t.portfolio_value_display(), "1.50M");
        assert_eq!(t.market_status(), &QueryStatus::Success);

        let rows = t.holdings();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total, 60_000_000.0);
    }

    #[tokio::test]
    async fn selectable_assets_hide_zero_volume() {
        let mut t = tracker();
        t.refresh_assets(false).await.unwrap();
        let ids: Vec<String> = t
            .selectable_assets()
            .into_iter()
            .map(|a| a.asset_id)
            .collect();
        assert_eq!(ids, vec!["BTC".to_string(), "ETH".to_string(), "USD".to_string()]);
    }

    #[test]
    fn snapshot_installed_directly() {
        let mut t = tracker();
        t.update_quantity("BTC", "2");
        t.market_mut().set_snapshot(vec![btc()], at(2024, 1, 1, 0));
        assert_eq!(t.portfolio_value(), 100_000.0);
        assert_eq!(t.portfolio_value_display(), "100.00k");
    }

    #[tokio::test]
    async fn offline_refresh_fails_without_fetching() {
        let mut t = tracker();
        t.set_connected(false);
        let err = t.refresh_assets(true).await.unwrap_err();
        assert!(matches!(err, CoreError::Offline));
        assert_eq!(t.market().source().asset_calls(), 0);
    }

    #[tokio::test]
    async fn refresh_failure_sets_error_status() {
        let source = ScriptedSource::new(market()).fail_next(CoreError::Api {
            provider: "Scripted".into(),
            message: "HTTP 403".into(),
        });
        let mut t = PortfolioTracker::new(Settings::default(), source, MemoryStore::new());
        assert!(t.refresh_assets(false).await.is_err());
        assert!(t.market_status().is_error());
        assert_eq!(t.portfolio_value(), 0.0);
    }

    #[tokio::test]
    async fn fetch_history_through_facade() {
        let source = ScriptedSource::new(market())
            .with_history(vec![sample(1, 40_000.0), sample(2, 50_000.0)]);
        let t = PortfolioTracker::new(Settings::default(), source, MemoryStore::new());
        let series = t
            .fetch_history("BTC", at(2024, 1, 1, 0), at(2024, 1, 3, 0))
            .await
            .unwrap();
        assert_eq!(series.change, "25.00%");
        assert_eq!(series.latest_close(), Some(50_000.0));
    }
}
