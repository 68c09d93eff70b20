//! 돌파 상태 테이블.
//!
//! 심볼마다 별도 잠금을 가진 `BreakoutState`를 보관합니다. 감시 폴링은 캐시된
//! 레벨만 읽고 이 테이블만 씁니다. 한 심볼의 현재가 조회 실패는 다른 심볼의
//! 평가를 막지 않습니다.

use chartwatch_core::{BreakoutAlert, BreakoutState, LevelPair, MarketDataProvider, WatchSymbol};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::CacheGeneration;

/// 한 번의 돌파 감시 결과.
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    /// 이번 폴링에서 새로 발생한 알림
    pub alerts: Vec<BreakoutAlert>,
    /// 폴링 후 심볼별 상태
    pub states: HashMap<String, BreakoutState>,
    /// 레벨이 있어 평가 대상이었던 심볼 수
    pub checked: usize,
    /// 현재가 조회 실패 수
    pub failed: usize,
}

/// 상태와, 그 상태가 기준으로 삼는 캐시 세대.
#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    state: BreakoutState,
}

type SharedSlot = Arc<Mutex<Slot>>;

/// 심볼별 돌파 상태.
///
/// 각 슬롯은 마지막으로 재무장된 캐시 세대를 기억합니다. 그보다 오래된 세대의
/// 레벨로 들어온 평가는 무시되므로, 분석 패스와 폴링이 겹쳐도 한 번의 돌파에
/// 알림은 한 번만 나갑니다.
#[derive(Debug, Default)]
pub struct BreakoutTable {
    slots: RwLock<HashMap<String, SharedSlot>>,
}

impl BreakoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, symbol: &str) -> SharedSlot {
        if let Some(slot) = self.slots.read().await.get(symbol) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(symbol.to_string()).or_default())
    }

    async fn existing(&self, symbol: &str) -> Option<SharedSlot> {
        self.slots.read().await.get(symbol).cloned()
    }

    /// 중립 상태로 등록합니다. 이미 있으면 그대로 둡니다.
    pub async fn register(&self, symbol: &str) {
        self.slot(symbol).await;
    }

    pub async fn remove(&self, symbol: &str) {
        self.slots.write().await.remove(symbol);
    }

    /// 감시 목록에 없는 심볼의 상태를 버립니다.
    pub async fn retain(&self, symbols: &[WatchSymbol]) {
        self.slots
            .write()
            .await
            .retain(|key, _| symbols.iter().any(|s| &s.symbol == key));
    }

    /// 새 세대의 레벨로 재무장합니다.
    ///
    /// 한 슬롯 잠금 안에서 중립으로 되돌리고, `latest`가 있으면 그 가격을 바로
    /// 평가합니다. 캐시에 새 세대를 게시하기 전에 호출해야 합니다.
    pub async fn rearm(
        &self,
        symbol: &str,
        generation: u64,
        latest: Option<(Decimal, &LevelPair)>,
    ) -> Option<BreakoutAlert> {
        let slot = self.slot(symbol).await;
        let mut slot = slot.lock().await;
        slot.generation = generation;
        slot.state.reset();
        let (price, levels) = latest?;
        slot.state.on_price(symbol, price, levels)
    }

    /// `generation` 세대의 레벨로 가격 하나를 평가합니다.
    ///
    /// 등록되지 않은 심볼이거나 슬롯이 더 새 세대로 재무장되었으면 `None`.
    pub async fn evaluate(
        &self,
        symbol: &str,
        generation: u64,
        price: Decimal,
        levels: &LevelPair,
    ) -> Option<BreakoutAlert> {
        let slot = self.existing(symbol).await?;
        let mut slot = slot.lock().await;
        if generation < slot.generation {
            debug!(symbol, generation, current = slot.generation, "stale levels, skipped");
            return None;
        }
        slot.state.on_price(symbol, price, levels)
    }

    pub async fn state(&self, symbol: &str) -> Option<BreakoutState> {
        let slot = self.existing(symbol).await?;
        let state = slot.lock().await.state.clone();
        Some(state)
    }

    pub async fn states(&self) -> HashMap<String, BreakoutState> {
        let slots: Vec<(String, SharedSlot)> = self
            .slots
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();

        let mut states = HashMap::with_capacity(slots.len());
        for (symbol, slot) in slots {
            let state = slot.lock().await.state.clone();
            states.insert(symbol, state);
        }
        states
    }

    /// 감시 목록의 현재가를 동시에 조회하여 캐시 세대의 레벨과 비교합니다.
    ///
    /// 레벨이 없거나 모두 "N/A"인 심볼은 조회하지 않습니다.
    pub async fn check_breakouts(
        &self,
        provider: &dyn MarketDataProvider,
        symbols: &[WatchSymbol],
        cached: &CacheGeneration,
    ) -> PollReport {
        let cached_levels = cached.levels();
        let targets: Vec<(&WatchSymbol, &LevelPair)> = symbols
            .iter()
            .filter_map(|s| cached_levels.get(&s.symbol).map(|l| (s, l)))
            .filter(|(_, l)| !l.is_undefined())
            .collect();

        let prices = join_all(targets.iter().map(|(symbol, _)| async move {
            provider.fetch_current_price(symbol).await
        }))
        .await;

        let mut report = PollReport {
            checked: targets.len(),
            ..Default::default()
        };

        for ((symbol, levels), price) in targets.into_iter().zip(prices) {
            match price {
                Ok(price) => {
                    let alert = self
                        .evaluate(&symbol.symbol, cached.generation, price, levels)
                        .await;
                    if let Some(alert) = alert {
                        report.alerts.push(alert);
                    } else {
                        debug!(symbol = %symbol, %price, "no breakout");
                    }
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "현재가 조회 실패, 이번 폴링 건너뜀");
                    report.failed += 1;
                }
            }
        }

        report.states = self.states().await;
        report
    }
}
