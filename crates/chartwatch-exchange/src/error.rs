//! 거래소 에러 타입.

use chartwatch_core::FetchError;
use std::time::Duration;
use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("네트워크 에러: {0}")]
    NetworkError(String),

    /// 요청 한도 초과 (HTTP 429/418)
    #[error("요청 한도 초과 (retry_after_ms={retry_after_ms:?})")]
    RateLimited {
        /// `Retry-After` 헤더 (밀리초)
        retry_after_ms: Option<u64>,
    },

    /// API 에러 코드
    #[error("API 에러 {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("응답 파싱 실패: {0}")]
    ParseError(String),

    /// 심볼을 찾을 수 없음
    #[error("알 수 없는 심볼: {0}")]
    SymbolNotFound(String),

    /// 빈 응답
    #[error("빈 응답: {0}")]
    EmptyResponse(String),

    /// 타임아웃
    #[error("요청 타임아웃: {0}")]
    Timeout(String),
}

/// 거래소 작업 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_decode() {
            ExchangeError::ParseError(err.to_string())
        } else {
            ExchangeError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<ExchangeError> for FetchError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::RateLimited { retry_after_ms } => FetchError::RateLimited {
                reason: err.to_string(),
                retry_after: retry_after_ms.map(Duration::from_millis),
            },
            ExchangeError::NetworkError(msg) => FetchError::Transport(msg),
            ExchangeError::Timeout(msg) => FetchError::Timeout(msg),
            ExchangeError::SymbolNotFound(msg) | ExchangeError::EmptyResponse(msg) => {
                FetchError::NoData(msg)
            }
            ExchangeError::ParseError(msg) => FetchError::Parse(msg),
            // 5xx는 일시적 장애로 간주
            ExchangeError::ApiError { code, message } if (500..600).contains(&code) => {
                FetchError::Transport(format!("HTTP {}: {}", code, message))
            }
            ExchangeError::ApiError { .. } => FetchError::Parse(err.to_string()),
        }
    }
}
