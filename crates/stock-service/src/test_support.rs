//! In-process fakes for the upstream collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stock_core::{
    AnalyticsSnapshot, AnalyticsSource, CompanyLookup, Competitor, MarketCap, MarketDataSource,
    OhlcRecord, OhlcStatus, PerformanceData,
};

pub struct FakeMarket {
    lookup: CompanyLookup,
    /// 1-based attempt number that first returns OK; `None` never succeeds.
    ok_on_attempt: Option<usize>,
    report_session_date: bool,
    pub name_calls: AtomicUsize,
    pub ohlc_dates: Mutex<Vec<NaiveDate>>,
}

impl FakeMarket {
    pub fn found(name: &str) -> Self {
        Self::with_lookup(CompanyLookup::Found { name: name.to_string() })
    }

    pub fn with_lookup(lookup: CompanyLookup) -> Self {
        Self {
            lookup,
            ok_on_attempt: Some(1),
            report_session_date: true,
            name_calls: AtomicUsize::new(0),
            ohlc_dates: Mutex::new(Vec::new()),
        }
    }

    pub fn ok_on_attempt(mut self, attempt: Option<usize>) -> Self {
        self.ok_on_attempt = attempt;
        self
    }

    pub fn without_session_date(mut self) -> Self {
        self.report_session_date = false;
        self
    }

    pub fn name_calls(&self) -> usize {
        self.name_calls.load(Ordering::SeqCst)
    }

    pub fn ohlc_calls(&self) -> usize {
        self.ohlc_dates.lock().unwrap().len()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.ohlc_dates.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataSource for FakeMarket {
    async fn resolve_company_name(&self, _ticker: &str) -> CompanyLookup {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup.clone()
    }

    async fn daily_ohlc(&self, ticker: &str, date: NaiveDate) -> OhlcRecord {
        let attempt = {
            let mut dates = self.ohlc_dates.lock().unwrap();
            dates.push(date);
            dates.len()
        };
        let day = date.format("%Y-%m-%d").to_string();

        match self.ok_on_attempt {
            Some(n) if attempt >= n => OhlcRecord {
                status: OhlcStatus::Ok,
                open: Some(100.0),
                high: Some(110.0),
                low: Some(95.0),
                close: Some(105.5),
                date: if self.report_session_date { day } else { String::new() },
                symbol: ticker.to_string(),
                error_message: None,
            },
            _ => OhlcRecord::invalid_date(ticker, &day),
        }
    }
}

pub struct FakeAnalytics {
    snapshot: AnalyticsSnapshot,
    pub calls: AtomicUsize,
}

impl FakeAnalytics {
    pub fn empty() -> Self {
        Self {
            snapshot: AnalyticsSnapshot::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn sample() -> Self {
        Self {
            snapshot: AnalyticsSnapshot {
                performance: PerformanceData {
                    five_days: Some(1.5),
                    one_month: Some(-2.25),
                    three_months: Some(4.0),
                    year_to_date: Some(10.0),
                    one_year: Some(20.5),
                },
                competitors: vec![Competitor {
                    name: "Microsoft Corp.".to_string(),
                    market_cap: MarketCap {
                        currency: Some("$".to_string()),
                        value: Some(3.1e12),
                    },
                }],
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticsSource for FakeAnalytics {
    async fn fetch(&self, _ticker: &str) -> AnalyticsSnapshot {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.clone()
    }
}

pub async fn memory_ledger() -> Arc<purchase_ledger::SqliteLedger> {
    let db = purchase_ledger::LedgerDb::new("sqlite::memory:").await.unwrap();
    Arc::new(purchase_ledger::SqliteLedger::new(db))
}
