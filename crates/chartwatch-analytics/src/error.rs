//! 분석 에러 타입.
//!
//! 분석 컴포넌트는 데이터 부족 시 에러 대신 "판단 불가" 결과를 반환하므로,
//! 이 에러는 주로 내부 보조 함수와 파라미터 검증에서 사용됩니다.

use rust_decimal::Decimal;
use thiserror::Error;

/// 분석 에러.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// 시계열이 컴포넌트 최소 길이보다 짧음
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientHistory { required: usize, provided: usize },

    /// 0으로 나누기 등 계산 불가
    #[error("계산 오류: {0}")]
    Computation(String),

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),
}

/// 분석 작업 Result 타입.
pub type AnalyticsResult<T> = Result<T, AnalysisError>;

/// 최소 길이를 확인합니다.
pub fn require_len(provided: usize, required: usize) -> AnalyticsResult<()> {
    if provided < required {
        return Err(AnalysisError::InsufficientHistory { required, provided });
    }
    Ok(())
}

/// `(to - from) / from` 상대 변화율. `from`이 0이면 계산 오류.
pub fn relative_change(from: Decimal, to: Decimal) -> AnalyticsResult<Decimal> {
    if from.is_zero() {
        return Err(AnalysisError::Computation(
            "기준값이 0이라 변화율을 계산할 수 없습니다".to_string(),
        ));
    }
    Ok((to - from) / from)
}

/// `|a - b| / base` 상대 간격. `base`가 0이면 계산 오류.
pub fn relative_gap(a: Decimal, b: Decimal, base: Decimal) -> AnalyticsResult<Decimal> {
    if base.is_zero() {
        return Err(AnalysisError::Computation(
            "기준값이 0이라 간격을 계산할 수 없습니다".to_string(),
        ));
    }
    Ok((a - b).abs() / base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_require_len() {
        assert!(require_len(20, 20).is_ok());
        assert_eq!(
            require_len(3, 20),
            Err(AnalysisError::InsufficientHistory {
                required: 20,
                provided: 3
            })
        );
    }

    #[test]
    fn test_zero_divisor_guarded() {
        assert!(relative_change(Decimal::ZERO, dec!(1)).is_err());
        assert!(matches!(
            relative_gap(dec!(1), dec!(2), Decimal::ZERO),
            Err(AnalysisError::Computation(_))
        ));
        assert_eq!(relative_change(dec!(100), dec!(102)).unwrap(), dec!(0.02));
        assert_eq!(relative_gap(dec!(100), dec!(100.5), dec!(100.5)).unwrap(), dec!(0.5) / dec!(100.5));
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisError::InsufficientHistory {
            required: 20,
            provided: 5,
        };
        assert_eq!(err.to_string(), "데이터가 부족합니다: 필요 20개, 제공 5개");
    }
}
