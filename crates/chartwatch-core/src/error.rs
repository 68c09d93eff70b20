//! 차트 감시 시스템의 에러 타입.
//!
//! 심볼 단위 실패는 에러가 아니라 `SymbolReport`로 기록되므로,
//! 여기 정의된 에러는 설정/입력처럼 시스템 경계에서 발생하는 것만 다룹니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum ChartwatchError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력 (심볼, 타임프레임 등)
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 캔들 시계열 불변식 위반
    #[error("잘못된 캔들 시계열: {0}")]
    InvalidSeries(String),

    /// 데이터 제공자 에러
    #[error("데이터 제공자 에러: {0}")]
    Provider(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type ChartwatchResult<T> = Result<T, ChartwatchError>;

impl ChartwatchError {
    /// 사용자 입력 문제로 인한 에러인지 확인합니다.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ChartwatchError::InvalidInput(_))
    }
}

impl From<serde_json::Error> for ChartwatchError {
    fn from(err: serde_json::Error) -> Self {
        ChartwatchError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ChartwatchError {
    fn from(err: config::ConfigError) -> Self {
        ChartwatchError::Config(err.to_string())
    }
}
