// ═══════════════════════════════════════════════════════════════════
// Shared test doubles — scripted market source, failing storage
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crypto_portfolio_core::errors::CoreError;
use crypto_portfolio_core::models::asset::Asset;
use crypto_portfolio_core::models::history::{HistoryRequest, RateSample};
use crypto_portfolio_core::providers::traits::MarketDataSource;
use crypto_portfolio_core::storage::kv::{KeyValueStore, MemoryStore};

/// A market source that replays queued results, then serves `assets` forever.
pub struct ScriptedSource {
    pub assets: Vec<Asset>,
    pub history: Vec<RateSample>,
    queued: Mutex<VecDeque<Result<Vec<Asset>, CoreError>>>,
    queued_history: Mutex<VecDeque<CoreError>>,
    asset_calls: AtomicUsize,
    history_calls: AtomicUsize,
    last_request: Mutex<Option<HistoryRequest>>,
}

impl ScriptedSource {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            assets,
            history: Vec::new(),
            queued: Mutex::new(VecDeque::new()),
            queued_history: Mutex::new(VecDeque::new()),
            asset_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_history(mut self, history: Vec<RateSample>) -> Self {
        self.history = history;
        self
    }

    /// Queue an error returned by the next `get_assets` call.
    pub fn fail_next(self, error: CoreError) -> Self {
        self.queued.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queue an error returned by the next `get_rate_history` call.
    pub fn fail_next_history(self, error: CoreError) -> Self {
        self.queued_history.lock().unwrap().push_back(error);
        self
    }

    pub fn asset_calls(&self) -> usize {
        self.asset_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<HistoryRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataSource for ScriptedSource {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn get_assets(&self) -> Result<Vec<Asset>, CoreError> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        match self.queued.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.assets.clone()),
        }
    }

    async fn get_rate_history(&self, request: &HistoryRequest) -> Result<Vec<RateSample>, CoreError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match self.queued_history.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(self.history.clone()),
        }
    }
}

/// A `MemoryStore` whose reads and writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        if self.fail_reads {
            return Err(CoreError::Storage("read refused".into()));
        }
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        if self.fail_writes {
            return Err(CoreError::Storage("disk full".into()));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool, CoreError> {
        if self.fail_writes {
            return Err(CoreError::Storage("disk full".into()));
        }
        self.inner.remove(key)
    }
}

pub fn btc() -> Asset {
    Asset::new("BTC", "Bitcoin")
        .with_price(50_000.0)
        .with_volumes(2_000_000.0, 40_000_000.0)
}

pub fn eth() -> Asset {
    Asset::new("ETH", "Ethereum")
        .with_price(3_000.0)
        .with_volumes(500_000.0, 9_000_000.0)
}

/// Listed but untraded: zero daily volume, no price.
pub fn dead() -> Asset {
    Asset::new("DEAD", "Delisted Coin").with_volumes(0.0, 0.0)
}

pub fn usd() -> Asset {
    Asset::new("USD", "US Dollar").with_volumes(0.0, 1_000.0)
}

pub fn market() -> Vec<Asset> {
    vec![btc(), eth(), dead(), usd()]
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn sample(day: u32, rate_close: f64) -> RateSample {
    RateSample {
        time_period_start: at(2024, 1, day, 0),
        rate_close,
    }
}
