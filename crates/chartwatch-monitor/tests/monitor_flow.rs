//! 모니터 통합 테스트 (메모리 시세 제공자 사용).

use async_trait::async_trait;
use chartwatch_core::{
    AnalysisConfig, BreakoutKind, CandleSeries, FetchError, Kline, MarketDataProvider,
    ScheduleConfig, SymbolReport, Timeframe, WatchSymbol,
};
use chartwatch_exchange::StaticProvider;
use chartwatch_monitor::{AddOutcome, Analyzer, Monitor, MonitorError, Scheduler};
use chartwatch_notification::{
    Notification, NotificationEvent, NotificationManager, NotificationResult, NotificationSender,
};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ==================== 헬퍼 ====================

/// 전송된 알림을 기록하는 전송기.
#[derive(Clone, Default)]
struct RecordingSender {
    events: Arc<Mutex<Vec<NotificationEvent>>>,
}

impl RecordingSender {
    fn breakouts(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, NotificationEvent::Breakout { .. }))
            .cloned()
            .collect()
    }

    fn breakout_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for event in self.breakouts() {
            if let NotificationEvent::Breakout { symbol, .. } = event {
                *counts.entry(symbol).or_insert(0) += 1;
            }
        }
        counts
    }

    fn system_errors(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                NotificationEvent::SystemError { error_code, .. } => Some(error_code.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        self.events.lock().unwrap().push(notification.event.clone());
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// 모든 조회를 지연시키는 제공자.
struct SlowProvider {
    inner: StaticProvider,
    delay: Duration,
}

#[async_trait]
impl MarketDataProvider for SlowProvider {
    async fn fetch_candles(
        &self,
        symbol: &WatchSymbol,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_candles(symbol, timeframe, count).await
    }

    async fn fetch_current_price(&self, symbol: &WatchSymbol) -> Result<Decimal, FetchError> {
        self.inner.fetch_current_price(symbol).await
    }

    fn provider_name(&self) -> &str {
        "slow"
    }
}

fn sym(s: &str) -> WatchSymbol {
    WatchSymbol::binance(s).unwrap()
}

fn klines(symbol: &str, timeframe: Timeframe, closes: &[Decimal]) -> Vec<Kline> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Kline::new(
                symbol,
                timeframe,
                start + ChronoDuration::hours(i as i64),
                c,
                c + dec!(1),
                c - dec!(1),
                c,
                dec!(10),
            )
        })
        .collect()
}

/// 종가 106 기준 지지 101, 저항 111이 되는 일봉 (k = 1).
fn ranged_closes() -> Vec<Decimal> {
    let mut closes = vec![dec!(106); 14];
    closes.extend([
        dec!(105),
        dec!(100),
        dec!(110),
        dec!(101),
        dec!(110.5),
        dec!(102),
        dec!(106),
    ]);
    closes
}

fn small_config() -> AnalysisConfig {
    AnalysisConfig {
        extrema_order: 1,
        confluence_timeframes: Vec::new(),
        ..Default::default()
    }
}

fn ranged_monitor(sender: &RecordingSender) -> (Arc<StaticProvider>, Monitor) {
    let provider = Arc::new(StaticProvider::new());
    provider.insert_klines("BTCUSDT", Timeframe::D1, klines("BTCUSDT", Timeframe::D1, &ranged_closes()));
    provider.set_price("BTCUSDT", dec!(106));

    let mut notifier = NotificationManager::new();
    notifier.add_sender(sender.clone());

    let analyzer = Analyzer::from_config(&small_config()).unwrap();
    let monitor = Monitor::new(provider.clone(), analyzer, [sym("BTC")]).with_notifier(notifier);
    (provider, monitor)
}

// ==================== 분석 패스 ====================

#[tokio::test]
async fn test_analysis_pass_populates_cache() {
    let symbols = [sym("BTC"), sym("ETH")];
    let timeframes = [
        Timeframe::D1,
        Timeframe::H4,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::W1,
    ];
    let provider = Arc::new(StaticProvider::random_walk(&symbols, &timeframes, 120));
    let analyzer = Analyzer::from_config(&AnalysisConfig::default()).unwrap();
    let monitor = Monitor::new(provider, analyzer, symbols.clone());

    let stats = monitor.trigger_analysis().await.expect("pass should run");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.analyzed, 2);

    let generation = monitor.snapshot().await;
    assert_eq!(generation.generation, 1);
    assert!(generation.last_updated.is_some());
    for symbol in &symbols {
        let report = generation.report(&symbol.symbol).unwrap();
        let result = report.analysis().unwrap();
        assert_eq!(&result.symbol, symbol);
        assert!(report.summary().contains(&symbol.to_string()));
    }
}

#[tokio::test]
async fn test_symbol_without_data_is_reported_not_fatal() {
    let sender = RecordingSender::default();
    let (provider, monitor) = ranged_monitor(&sender);
    monitor.add_symbol("doge").await.unwrap();
    provider.fail_with("BTCUSDT", FetchError::Parse("bad payload".into()));

    let stats = monitor.trigger_analysis().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.no_data, 1);
    assert_eq!(stats.failed, 1);

    let generation = monitor.snapshot().await;
    assert!(matches!(
        generation.report("DOGEUSDT"),
        Some(SymbolReport::NoData { .. })
    ));
    assert!(matches!(
        generation.report("BTCUSDT"),
        Some(SymbolReport::Failed { .. })
    ));
    assert!(generation.levels().is_empty());
}

// ==================== 돌파 감시 ====================

#[tokio::test]
async fn test_breakout_alert_once_per_crossing() {
    let sender = RecordingSender::default();
    let (provider, monitor) = ranged_monitor(&sender);

    monitor.trigger_analysis().await.unwrap();
    let levels = monitor.snapshot().await.levels()["BTCUSDT"];
    assert_eq!(levels.nearest_support, Some(dec!(101)));
    assert_eq!(levels.nearest_resistance, Some(dec!(111)));
    assert!(sender.breakouts().is_empty());

    provider.set_price("BTCUSDT", dec!(100));
    let report = monitor.poll_breakouts().await.unwrap();
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].kind, BreakoutKind::SupportBroken);
    assert!(report.states["BTCUSDT"].support_broken);

    for price in [dec!(99), dec!(95), dec!(100.5)] {
        provider.set_price("BTCUSDT", price);
        let report = monitor.poll_breakouts().await.unwrap();
        assert!(report.alerts.is_empty());
    }
    assert_eq!(sender.breakouts().len(), 1);

    // 재분석은 상태를 중립으로 되돌린다
    provider.set_price("BTCUSDT", dec!(106));
    monitor.trigger_analysis().await.unwrap();
    assert!(monitor.breakout_states().await["BTCUSDT"].is_neutral());
}

#[tokio::test]
async fn test_price_beyond_level_at_analysis_alerts_once() {
    let sender = RecordingSender::default();
    let (provider, monitor) = ranged_monitor(&sender);
    provider.set_price("BTCUSDT", dec!(112));

    monitor.trigger_analysis().await.unwrap();

    let breakouts = sender.breakouts();
    assert_eq!(breakouts.len(), 1);
    assert!(matches!(
        &breakouts[0],
        NotificationEvent::Breakout { kind, level, .. }
            if kind == "resistance_broken" && *level == dec!(111)
    ));

    let report = monitor.poll_breakouts().await.unwrap();
    assert!(report.alerts.is_empty());
    assert!(report.states["BTCUSDT"].resistance_broken);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_polling_during_pass_alerts_once_per_symbol() {
    let provider = Arc::new(StaticProvider::new());
    let symbols: Vec<WatchSymbol> = (0..200).map(|i| sym(&format!("C{i}"))).collect();
    for symbol in &symbols {
        let bars = klines(&symbol.symbol, Timeframe::D1, &ranged_closes());
        provider.insert_klines(&symbol.symbol, Timeframe::D1, bars);
        // 저항 111 위
        provider.set_price(&symbol.symbol, dec!(112));
    }

    let sender = RecordingSender::default();
    let mut notifier = NotificationManager::new();
    notifier.add_sender(sender.clone());
    let analyzer = Analyzer::from_config(&small_config()).unwrap();
    let monitor = Arc::new(
        Monitor::new(provider.clone(), analyzer, symbols.clone()).with_notifier(notifier),
    );

    let done = Arc::new(AtomicBool::new(false));
    let poller = {
        let monitor = Arc::clone(&monitor);
        let done = Arc::clone(&done);
        tokio::spawn(async move {
            while !done.load(Ordering::Acquire) {
                monitor.poll_breakouts().await;
                tokio::task::yield_now().await;
            }
        })
    };

    monitor.trigger_analysis().await.unwrap();
    done.store(true, Ordering::Release);
    poller.await.unwrap();
    monitor.poll_breakouts().await.unwrap();

    let counts = sender.breakout_counts();
    assert_eq!(counts.len(), symbols.len());
    assert!(counts.values().all(|&n| n == 1), "duplicate alerts: {counts:?}");
}

#[tokio::test]
async fn test_poll_before_analysis_checks_nothing() {
    let sender = RecordingSender::default();
    let (provider, monitor) = ranged_monitor(&sender);

    let report = monitor.poll_breakouts().await.unwrap();
    assert_eq!(report.checked, 0);
    assert_eq!(provider.price_calls(), 0);
}

// ==================== 비재진입 ====================

#[tokio::test(start_paused = true)]
async fn test_concurrent_trigger_is_dropped() {
    let inner = StaticProvider::new();
    inner.insert_klines("BTCUSDT", Timeframe::D1, klines("BTCUSDT", Timeframe::D1, &ranged_closes()));
    let provider = Arc::new(SlowProvider {
        inner,
        delay: Duration::from_secs(5),
    });
    let analyzer = Analyzer::from_config(&small_config()).unwrap();
    let monitor = Arc::new(Monitor::new(provider, analyzer, [sym("BTC")]));

    let running = Arc::clone(&monitor);
    let first = tokio::spawn(async move { running.trigger_analysis().await });
    while !monitor.is_analysis_running() {
        tokio::task::yield_now().await;
    }

    assert!(monitor.trigger_analysis().await.is_none());

    let stats = first.await.unwrap().expect("first pass completes");
    assert_eq!(stats.analyzed, 1);
    assert!(!monitor.is_analysis_running());
    assert_eq!(monitor.snapshot().await.generation, 1);

    // 가드가 풀린 뒤에는 다시 실행된다
    assert!(monitor.trigger_analysis().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_symbol_removed_mid_pass_gets_no_state_or_alert() {
    let inner = StaticProvider::new();
    for symbol in ["BTCUSDT", "ETHUSDT"] {
        inner.insert_klines(symbol, Timeframe::D1, klines(symbol, Timeframe::D1, &ranged_closes()));
        inner.set_price(symbol, dec!(112));
    }
    let provider = Arc::new(SlowProvider {
        inner,
        delay: Duration::from_secs(5),
    });

    let sender = RecordingSender::default();
    let mut notifier = NotificationManager::new();
    notifier.add_sender(sender.clone());
    let analyzer = Analyzer::from_config(&small_config()).unwrap();
    let monitor = Arc::new(
        Monitor::new(provider, analyzer, [sym("BTC"), sym("ETH")]).with_notifier(notifier),
    );

    let running = Arc::clone(&monitor);
    let pass = tokio::spawn(async move { running.trigger_analysis().await });
    while !monitor.is_analysis_running() {
        tokio::task::yield_now().await;
    }

    assert!(monitor.remove_symbol("eth").await.unwrap());
    pass.await.unwrap().expect("pass completes");

    assert!(!monitor.breakout_states().await.contains_key("ETHUSDT"));
    let counts = sender.breakout_counts();
    assert_eq!(counts.get("BTCUSDT"), Some(&1));
    assert!(!counts.contains_key("ETHUSDT"));
}

#[tokio::test]
async fn test_pass_without_any_analysis_sends_system_error() {
    let sender = RecordingSender::default();
    let (provider, monitor) = ranged_monitor(&sender);
    provider.fail_with("BTCUSDT", FetchError::NoData("delisted".into()));

    let stats = monitor.trigger_analysis().await.unwrap();
    assert_eq!(stats.analyzed, 0);
    assert_eq!(sender.system_errors(), vec!["ANALYSIS_PASS_EMPTY".to_string()]);

    provider.clear_failure("BTCUSDT");
    monitor.trigger_analysis().await.unwrap();
    assert_eq!(sender.system_errors().len(), 1);
}

// ==================== 감시 목록 편집 ====================

#[tokio::test]
async fn test_add_and_remove_symbol_trigger_analysis() {
    let sender = RecordingSender::default();
    let (_provider, monitor) = ranged_monitor(&sender);

    assert_eq!(monitor.add_symbol("sol").await.unwrap(), AddOutcome::Added);
    let generation = monitor.snapshot().await;
    assert_eq!(generation.generation, 1);
    assert!(generation.report("SOLUSDT").is_some());
    assert!(monitor.breakout_states().await.contains_key("SOLUSDT"));

    assert_eq!(
        monitor.add_symbol("SOLUSDT").await.unwrap(),
        AddOutcome::AlreadyTracked
    );
    assert_eq!(monitor.snapshot().await.generation, 1);

    assert!(matches!(
        monitor.add_symbol("bad-sym").await,
        Err(MonitorError::InvalidSymbol(_))
    ));

    assert!(monitor.remove_symbol("sol").await.unwrap());
    let generation = monitor.snapshot().await;
    assert_eq!(generation.generation, 2);
    assert!(generation.report("SOLUSDT").is_none());
    assert!(!monitor.breakout_states().await.contains_key("SOLUSDT"));

    assert!(!monitor.remove_symbol("sol").await.unwrap());
    assert_eq!(monitor.symbols().await, vec![sym("BTC")]);
}

// ==================== 시세 조회 ====================

#[tokio::test]
async fn test_current_prices_and_24h_change() {
    let provider = Arc::new(StaticProvider::new());
    let hourly: Vec<Decimal> = (0..30).map(|i| Decimal::from(90 + i)).collect();
    provider.insert_klines("BTCUSDT", Timeframe::H1, klines("BTCUSDT", Timeframe::H1, &hourly));
    provider.set_price("BTCUSDT", dec!(119.5));

    let analyzer = Analyzer::from_config(&small_config()).unwrap();
    let monitor = Monitor::new(provider, analyzer, [sym("BTC"), sym("ETH")]);

    let prices = monitor.current_prices().await;
    assert_eq!(prices["BTCUSDT"], Some(dec!(119.5)));
    assert_eq!(prices["ETHUSDT"], None);

    // 마지막 24개: 96 → 119
    let changes = monitor.price_change_24h().await;
    assert_eq!(changes["BTCUSDT"], Some(dec!(23.96)));
    assert_eq!(changes["ETHUSDT"], None);
}

// ==================== 스케줄러 ====================

#[tokio::test(start_paused = true)]
async fn test_scheduler_runs_initial_pass_and_polls() {
    let sender = RecordingSender::default();
    let (provider, monitor) = ranged_monitor(&sender);
    let monitor = Arc::new(monitor);

    let schedule = ScheduleConfig {
        analysis_interval_secs: 3600,
        breakout_poll_secs: 10,
    };
    let shutdown = CancellationToken::new();
    let handle = Scheduler::new(Arc::clone(&monitor), &schedule).start(shutdown.clone());

    tokio::time::sleep(Duration::from_secs(25)).await;
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(monitor.snapshot().await.generation, 1);
    // 분석 시 1회 + 10초, 20초 폴링
    assert!(provider.price_calls() >= 3);
}
