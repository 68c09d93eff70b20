//! 에러 타입 정의.
//!
//! 심볼 단위 분석 실패는 `SymbolReport`로 기록되므로 여기에는 포함되지 않습니다.

use chartwatch_analytics::AnalysisError;
use chartwatch_core::ChartwatchError;
use thiserror::Error;

/// 모니터 에러 타입
#[derive(Debug, Error)]
pub enum MonitorError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 심볼 입력
    #[error("잘못된 심볼: {0}")]
    InvalidSymbol(String),

    /// 데이터 제공자 초기화 에러
    #[error("데이터 제공자 에러: {0}")]
    Provider(String),

    /// 분석기 구성 에러
    #[error("분석기 구성 에러: {0}")]
    Analysis(#[from] AnalysisError),
}

impl From<ChartwatchError> for MonitorError {
    fn from(err: ChartwatchError) -> Self {
        match err {
            ChartwatchError::InvalidInput(msg) => Self::InvalidSymbol(msg),
            ChartwatchError::Config(msg) => Self::Config(msg),
            ChartwatchError::Provider(msg) => Self::Provider(msg),
            other => Self::Config(other.to_string()),
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: MonitorError = ChartwatchError::InvalidInput("b@d".into()).into();
        assert!(matches!(err, MonitorError::InvalidSymbol(_)));

        let err: MonitorError = ChartwatchError::Config("x".into()).into();
        assert_eq!(err.to_string(), "설정 에러: x");
    }
}
