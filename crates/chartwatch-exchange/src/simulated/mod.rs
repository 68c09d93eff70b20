//! 메모리 기반 시세 제공자.
//!
//! 네트워크 없이 분석 파이프라인을 돌리기 위한 제공자입니다:
//! - 테스트: 고정 캔들/가격을 넣고 호출 횟수와 에러 주입을 확인
//! - 드라이런: 무작위 보행 캔들을 생성하여 감시 루프를 시험

use async_trait::async_trait;
use chartwatch_core::{
    CandleSeries, FetchError, Kline, MarketDataProvider, Timeframe, WatchSymbol,
};
use chrono::{Duration, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 메모리 시세 제공자.
#[derive(Debug, Default)]
pub struct StaticProvider {
    candles: RwLock<HashMap<(String, Timeframe), Vec<Kline>>>,
    prices: RwLock<HashMap<String, Decimal>>,
    /// 심볼별 강제 에러
    failures: RwLock<HashMap<String, FetchError>>,
    candle_calls: AtomicUsize,
    price_calls: AtomicUsize,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 심볼/타임프레임에 무작위 보행 캔들을 채웁니다.
    ///
    /// 현재가는 첫 타임프레임의 마지막 종가로 설정됩니다.
    pub fn random_walk(symbols: &[WatchSymbol], timeframes: &[Timeframe], bars: usize) -> Self {
        let provider = Self::new();
        for symbol in symbols {
            for (i, &timeframe) in timeframes.iter().enumerate() {
                let klines =
                    generate_sample_klines(&symbol.symbol, timeframe, bars, dec!(100), dec!(0.02));
                if i == 0 {
                    if let Some(last) = klines.last() {
                        provider.set_price(&symbol.symbol, last.close);
                    }
                }
                provider.insert_klines(&symbol.symbol, timeframe, klines);
            }
        }
        provider
    }

    pub fn insert_klines(&self, symbol: &str, timeframe: Timeframe, klines: Vec<Kline>) {
        write(&self.candles).insert((symbol.to_string(), timeframe), klines);
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        write(&self.prices).insert(symbol.to_string(), price);
    }

    /// 이후 모든 조회가 `error`로 실패하도록 합니다.
    pub fn fail_with(&self, symbol: &str, error: FetchError) {
        write(&self.failures).insert(symbol.to_string(), error);
    }

    pub fn clear_failure(&self, symbol: &str) {
        write(&self.failures).remove(symbol);
    }

    pub fn candle_calls(&self) -> usize {
        self.candle_calls.load(Ordering::SeqCst)
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    fn failure(&self, symbol: &str) -> Option<FetchError> {
        read(&self.failures).get(symbol).cloned()
    }
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    async fn fetch_candles(
        &self,
        symbol: &WatchSymbol,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries, FetchError> {
        self.candle_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure(&symbol.symbol) {
            return Err(err);
        }

        let bars = {
            let candles = read(&self.candles);
            let all = candles
                .get(&(symbol.symbol.clone(), timeframe))
                .filter(|bars| !bars.is_empty())
                .ok_or_else(|| {
                    FetchError::NoData(format!("{} {}: 캔들 없음", symbol, timeframe))
                })?;
            all[all.len().saturating_sub(count)..].to_vec()
        };

        CandleSeries::new(symbol.symbol.clone(), timeframe, bars)
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn fetch_current_price(&self, symbol: &WatchSymbol) -> Result<Decimal, FetchError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure(&symbol.symbol) {
            return Err(err);
        }
        read(&self.prices)
            .get(&symbol.symbol)
            .copied()
            .ok_or_else(|| FetchError::NoData(format!("{}: 현재가 없음", symbol)))
    }

    fn provider_name(&self) -> &str {
        "static"
    }
}

/// 무작위 보행 캔들을 생성합니다.
pub fn generate_sample_klines(
    symbol: &str,
    timeframe: Timeframe,
    count: usize,
    start_price: Decimal,
    volatility: Decimal,
) -> Vec<Kline> {
    use rand::Rng;

    let mut klines = Vec::with_capacity(count);
    let mut rng = rand::thread_rng();
    let mut current_price = start_price.round_dp(8);

    let tf_duration =
        Duration::from_std(timeframe.duration()).unwrap_or_else(|_| Duration::minutes(1));
    let mut current_time = Utc::now() - tf_duration * count as i32;

    let volatility_f64 = volatility.to_string().parse::<f64>().unwrap_or(0.02);
    let floor = dec!(0.00000001);

    for _ in 0..count {
        let change_pct = (rng.gen::<f64>() - 0.5) * 2.0 * volatility_f64;
        let change = current_price * Decimal::from_f64(change_pct).unwrap_or_default();

        let open = current_price;
        let close = (current_price + change).round_dp(8).max(floor);

        let high_extra =
            current_price * Decimal::from_f64(rng.gen::<f64>() * 0.01).unwrap_or_default();
        let low_extra =
            current_price * Decimal::from_f64(rng.gen::<f64>() * 0.01).unwrap_or_default();

        let high = (open.max(close) + high_extra).round_dp(8);
        let low = (open.min(close) - low_extra).round_dp(8).max(floor);

        let volume = Decimal::from_f64(rng.gen_range(10.0..1000.0))
            .unwrap_or(dec!(100))
            .round_dp(4);

        klines.push(Kline::new(
            symbol,
            timeframe,
            current_time,
            open,
            high,
            low,
            close,
            volume,
        ));

        current_price = close;
        current_time += tf_duration;
    }

    klines
}
