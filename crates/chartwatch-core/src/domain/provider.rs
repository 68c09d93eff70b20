//! 시세 데이터 제공자 추상화.
//!
//! 분석 엔진은 특정 거래소에 의존하지 않고 이 trait만 사용합니다.
//! "데이터 없음"은 예외가 아니라 `FetchOutcome::NoData`로 전달됩니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use super::CandleSeries;
use crate::types::{Timeframe, WatchSymbol};

// =============================================================================
// 에러 타입
// =============================================================================

/// 데이터 조회 에러.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// 빈 응답 또는 존재하지 않는 심볼
    #[error("데이터 없음: {0}")]
    NoData(String),

    /// 요청 한도 초과. 서버가 대기 시간을 알려주면 `retry_after`에 담깁니다.
    #[error("요청 한도 초과: {reason}")]
    RateLimited {
        reason: String,
        retry_after: Option<Duration>,
    },

    /// 연결/HTTP 에러
    #[error("전송 에러: {0}")]
    Transport(String),

    /// 타임아웃
    #[error("타임아웃: {0}")]
    Timeout(String),

    /// 응답 파싱 실패
    #[error("파싱 에러: {0}")]
    Parse(String),
}

impl FetchError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited { .. } | FetchError::Transport(_) | FetchError::Timeout(_)
        )
    }

    /// 대기 시간 힌트가 없는 한도 초과 에러.
    pub fn rate_limited(reason: impl Into<String>) -> Self {
        FetchError::RateLimited {
            reason: reason.into(),
            retry_after: None,
        }
    }

    /// 서버가 요구한 최소 재시도 대기 시간.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// 조회 결과.
///
/// 재시도 가능한 에러는 `TransientError`로, 빈 데이터는 `NoData`로 구분합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Ok(T),
    NoData(String),
    TransientError(FetchError),
    /// 재시도해도 해결되지 않는 에러 (파싱 실패 등)
    Failed(FetchError),
}

impl<T> From<Result<T, FetchError>> for FetchOutcome<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => FetchOutcome::Ok(value),
            Err(FetchError::NoData(reason)) => FetchOutcome::NoData(reason),
            Err(err) if err.is_retryable() => FetchOutcome::TransientError(err),
            Err(err) => FetchOutcome::Failed(err),
        }
    }
}

impl<T> FetchOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            FetchOutcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// 재시도 소진 후의 최종 판정.
    ///
    /// 일시적 에러는 "데이터 없음"으로 강등됩니다.
    pub fn settle(self) -> Self {
        match self {
            FetchOutcome::TransientError(err) => {
                FetchOutcome::NoData(format!("재시도 소진: {}", err))
            }
            other => other,
        }
    }
}

// =============================================================================
// MarketDataProvider Trait
// =============================================================================

/// 시세 데이터 제공자.
///
/// 구현체는 모든 네트워크 호출에 제한된 타임아웃을 걸어야 합니다.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 최근 `count`개의 캔들을 시간 오름차순으로 조회합니다.
    ///
    /// # Errors
    ///
    /// - `FetchError::NoData`: 빈 응답 또는 알 수 없는 심볼
    /// - `FetchError::RateLimited` / `Transport` / `Timeout`: 재시도 가능
    /// - `FetchError::Parse`: 응답 형식 오류
    async fn fetch_candles(
        &self,
        symbol: &WatchSymbol,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries, FetchError>;

    /// 현재가를 조회합니다.
    async fn fetch_current_price(&self, symbol: &WatchSymbol) -> Result<Decimal, FetchError>;

    /// 로깅용 제공자 이름.
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(FetchError::rate_limited("429").is_retryable());
        assert!(FetchError::Timeout("10s".into()).is_retryable());
        assert!(FetchError::Transport("reset".into()).is_retryable());
        assert!(!FetchError::NoData("empty".into()).is_retryable());
        assert!(!FetchError::Parse("bad json".into()).is_retryable());
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: FetchOutcome<u32> = Ok(1).into();
        assert_eq!(ok, FetchOutcome::Ok(1));

        let no_data: FetchOutcome<u32> = Err(FetchError::NoData("empty".into())).into();
        assert_eq!(no_data, FetchOutcome::NoData("empty".into()));

        let transient: FetchOutcome<u32> = Err(FetchError::Timeout("t".into())).into();
        assert!(matches!(transient, FetchOutcome::TransientError(_)));

        let failed: FetchOutcome<u32> = Err(FetchError::Parse("p".into())).into();
        assert!(matches!(failed, FetchOutcome::Failed(_)));
    }

    #[test]
    fn test_settle_degrades_transient_to_no_data() {
        let outcome: FetchOutcome<u32> =
            FetchOutcome::TransientError(FetchError::rate_limited("429"));
        assert!(matches!(outcome.settle(), FetchOutcome::NoData(r) if r.contains("429")));

        let ok = FetchOutcome::Ok(5).settle();
        assert_eq!(ok.ok(), Some(5));
    }
}
