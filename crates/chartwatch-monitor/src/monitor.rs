//! 감시 모니터.
//!
//! 감시 목록, 결과 캐시, 돌파 상태 테이블을 묶어 외부(스케줄러, CLI)에
//! 다음 작업을 제공합니다:
//! - 분석 패스 실행 (`trigger_analysis`)
//! - 돌파 감시 (`poll_breakouts`)
//! - 감시 목록 편집 (`add_symbol`, `remove_symbol`)
//! - 현재가 / 24시간 변동률 조회
//!
//! 분석 패스와 돌파 감시는 각각 비재진입 가드를 가지며,
//! 이미 실행 중이면 새 요청은 대기열에 넣지 않고 버립니다.

use chartwatch_analytics::error::relative_change;
use chartwatch_core::{
    BreakoutAlert, BreakoutState, MarketDataProvider, Timeframe, WatchSymbol,
};
use chartwatch_notification::NotificationManager;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::breakout::{BreakoutTable, PollReport};
use crate::cache::{CacheGeneration, ResultCache};
use crate::error::Result;
use crate::orchestrator::Analyzer;
use crate::stats::PassStats;
use crate::watchlist::{AddOutcome, Watchlist};

/// 24시간 변동률 계산에 쓰는 시간봉 수.
const CHANGE_24H_BARS: usize = 24;

/// 한 심볼도 분석하지 못한 패스의 시스템 오류 코드.
const PASS_EMPTY_CODE: &str = "ANALYSIS_PASS_EMPTY";

/// 실행 중 플래그를 잡고, 해제 시 되돌리는 가드.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 감시 모니터.
pub struct Monitor {
    provider: Arc<dyn MarketDataProvider>,
    analyzer: Analyzer,
    watchlist: Watchlist,
    cache: ResultCache,
    breakouts: BreakoutTable,
    notifier: NotificationManager,
    analysis_running: AtomicBool,
    poll_running: AtomicBool,
}

impl Monitor {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        analyzer: Analyzer,
        symbols: impl IntoIterator<Item = WatchSymbol>,
    ) -> Self {
        Self {
            provider,
            analyzer,
            watchlist: Watchlist::new(symbols),
            cache: ResultCache::new(),
            breakouts: BreakoutTable::new(),
            notifier: NotificationManager::new(),
            analysis_running: AtomicBool::new(false),
            poll_running: AtomicBool::new(false),
        }
    }

    /// 알림 관리자를 교체합니다.
    pub fn with_notifier(mut self, notifier: NotificationManager) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn is_analysis_running(&self) -> bool {
        self.analysis_running.load(Ordering::Acquire)
    }

    /// 분석 패스를 실행합니다.
    ///
    /// 이미 패스가 실행 중이면 아무것도 하지 않고 `None`을 반환합니다.
    /// 패스가 끝나면 감시 목록에 남은 심볼의 돌파 상태를 새 세대 기준 중립으로
    /// 되돌리고 분석 시점 현재가로 한 번 평가한 뒤, 캐시에 새 세대를 게시합니다.
    pub async fn trigger_analysis(&self) -> Option<PassStats> {
        let Some(_guard) = RunGuard::try_acquire(&self.analysis_running) else {
            info!("분석 패스가 이미 실행 중이므로 요청을 무시합니다");
            return None;
        };

        let symbols = self.watchlist.snapshot().await;
        info!(
            symbols = symbols.len(),
            provider = self.provider.provider_name(),
            "분석 패스 시작"
        );

        let output = self.analyzer.run_pass(self.provider.as_ref(), &symbols).await;
        output.stats.log_summary("분석 패스");
        let stats = output.stats;

        // 새 레벨을 게시하기 전에 슬롯을 새 세대로 재무장한다.
        // 게시 후에 되돌리면 그 사이 폴링이 같은 돌파를 먼저 알릴 수 있다.
        let generation = self.cache.prepare(output.reports).await;
        let tracked = self.watchlist.snapshot().await;
        self.breakouts.retain(&tracked).await;

        let mut alerts = Vec::new();
        for symbol in &tracked {
            let Some(report) = generation.report(&symbol.symbol) else {
                continue;
            };
            let latest = report
                .analysis()
                .map(|result| (result.current_price, &result.levels));
            if let Some(alert) = self
                .breakouts
                .rearm(&symbol.symbol, generation.generation, latest)
                .await
            {
                alerts.push(alert);
            }
        }
        self.cache.publish(generation).await;
        self.dispatch(&alerts).await;

        if let Err(e) = self
            .notifier
            .notify_analysis_completed(
                stats.analyzed,
                stats.no_data,
                stats.failed,
                stats.elapsed.as_millis() as u64,
            )
            .await
        {
            error!(error = %e, "분석 완료 알림 전송 실패");
        }

        if stats.total > 0 && stats.analyzed == 0 {
            let message = format!(
                "{}개 심볼 모두 분석 실패 (데이터 없음 {}, 실패 {}, 시간 초과 {})",
                stats.total, stats.no_data, stats.failed, stats.timed_out
            );
            warn!(total = stats.total, "분석된 심볼 없음");
            if let Err(e) = self
                .notifier
                .notify_system_error(PASS_EMPTY_CODE, &message)
                .await
            {
                error!(error = %e, "시스템 오류 알림 전송 실패");
            }
        }

        Some(stats)
    }

    /// 캐시된 레벨 기준으로 돌파를 감시합니다.
    ///
    /// 이전 감시가 아직 실행 중이면 `None`.
    pub async fn poll_breakouts(&self) -> Option<PollReport> {
        let Some(_guard) = RunGuard::try_acquire(&self.poll_running) else {
            debug!("previous breakout poll still running, tick skipped");
            return None;
        };

        let symbols = self.watchlist.snapshot().await;
        let cached = self.cache.snapshot().await;
        let report = self
            .breakouts
            .check_breakouts(self.provider.as_ref(), &symbols, &cached)
            .await;

        self.dispatch(&report.alerts).await;
        Some(report)
    }

    /// 알림을 로그로 남기고 전송합니다. 전송 실패는 상태 머신에 영향을 주지 않습니다.
    async fn dispatch(&self, alerts: &[BreakoutAlert]) {
        for alert in alerts {
            warn!(
                symbol = %alert.symbol,
                kind = %alert.kind,
                level = %alert.level,
                price = %alert.price,
                "{}",
                alert.message
            );
            if let Err(e) = self
                .notifier
                .notify_breakout(
                    &alert.symbol,
                    &alert.kind.to_string(),
                    alert.level,
                    alert.price,
                    &alert.message,
                )
                .await
            {
                error!(symbol = %alert.symbol, error = %e, "돌파 알림 전송 실패");
            }
        }
    }

    /// 심볼을 추가하고 분석 패스를 요청합니다.
    ///
    /// 입력은 대문자로 정규화되고 호가 자산이 없으면 `USDT`가 붙습니다.
    pub async fn add_symbol(&self, input: &str) -> Result<AddOutcome> {
        let symbol: WatchSymbol = input.parse()?;
        let outcome = self.watchlist.add(symbol.clone()).await;

        match outcome {
            AddOutcome::Added => {
                info!(symbol = %symbol, "감시 목록에 추가");
                self.breakouts.register(&symbol.symbol).await;
                self.trigger_analysis().await;
            }
            AddOutcome::AlreadyTracked => {
                info!(symbol = %symbol, "이미 감시 중인 심볼");
            }
        }
        Ok(outcome)
    }

    /// 심볼을 삭제하고 분석 패스를 요청합니다. 삭제했으면 `true`.
    pub async fn remove_symbol(&self, input: &str) -> Result<bool> {
        let symbol: WatchSymbol = input.parse()?;
        let removed = self.watchlist.remove(&symbol.symbol).await;

        if removed {
            info!(symbol = %symbol, "감시 목록에서 삭제");
            self.breakouts.remove(&symbol.symbol).await;
            self.trigger_analysis().await;
        }
        Ok(removed)
    }

    pub async fn symbols(&self) -> Vec<WatchSymbol> {
        self.watchlist.snapshot().await
    }

    /// 최근 분석 결과 세대.
    pub async fn snapshot(&self) -> Arc<CacheGeneration> {
        self.cache.snapshot().await
    }

    pub async fn breakout_states(&self) -> HashMap<String, BreakoutState> {
        self.breakouts.states().await
    }

    /// 감시 중인 모든 심볼의 현재가. 조회 실패는 `None`.
    pub async fn current_prices(&self) -> HashMap<String, Option<Decimal>> {
        let symbols = self.watchlist.snapshot().await;
        let prices = join_all(symbols.iter().map(|s| self.provider.fetch_current_price(s))).await;

        symbols
            .into_iter()
            .zip(prices)
            .map(|(symbol, price)| match price {
                Ok(price) => (symbol.symbol, Some(price)),
                Err(e) => {
                    debug!(symbol = %symbol, error = %e, "price unavailable");
                    (symbol.symbol, None)
                }
            })
            .collect()
    }

    /// 최근 24개 시간봉 기준 변동률(%).
    ///
    /// 조회 실패 또는 첫 종가가 0이면 `None`.
    pub async fn price_change_24h(&self) -> HashMap<String, Option<Decimal>> {
        let symbols = self.watchlist.snapshot().await;
        let series = join_all(
            symbols
                .iter()
                .map(|s| self.provider.fetch_candles(s, Timeframe::H1, CHANGE_24H_BARS)),
        )
        .await;

        symbols
            .into_iter()
            .zip(series)
            .map(|(symbol, series)| {
                let change = series.ok().and_then(|series| {
                    let first = series.bars().first()?.close;
                    let last = series.last_close();
                    relative_change(first, last)
                        .ok()
                        .map(|r| (r * Decimal::ONE_HUNDRED).round_dp(2))
                });
                (symbol.symbol, change)
            })
            .collect()
    }
}
