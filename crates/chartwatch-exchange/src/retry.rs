//! 재시도 래퍼.
//!
//! 재시도 가능한 `FetchError`(한도 초과, 전송 실패, 타임아웃)에 대해 지수 백오프로
//! 다시 시도합니다. 서버가 `Retry-After`로 더 긴 대기를 요구하면 그 시간을 따릅니다.
//! 그 외 에러는 즉시 반환합니다.

use async_trait::async_trait;
use chartwatch_core::{
    CandleSeries, FetchError, MarketDataProvider, ProviderConfig, Timeframe, WatchSymbol,
};
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 재시도 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &ProviderConfig) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            multiplier: settings.backoff_multiplier.max(1),
        }
    }

    /// 재시도 없이 한 번만 시도.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// `retry`번째 재시도 전 대기 시간 (0부터).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(self.multiplier.saturating_pow(retry))
    }

    /// 작업을 정책에 따라 실행합니다.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let backoff = self.backoff(attempt - 1);
                    let wait = err.retry_after().map_or(backoff, |hint| hint.max(backoff));
                    warn!(
                        what,
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// 재시도 정책을 적용한 제공자.
#[derive(Debug, Clone)]
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: MarketDataProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for RetryingProvider<P> {
    async fn fetch_candles(
        &self,
        symbol: &WatchSymbol,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries, FetchError> {
        self.policy
            .run("candles", || self.inner.fetch_candles(symbol, timeframe, count))
            .await
    }

    async fn fetch_current_price(&self, symbol: &WatchSymbol) -> Result<Decimal, FetchError> {
        self.policy
            .run("price", || self.inner.fetch_current_price(symbol))
            .await
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}
