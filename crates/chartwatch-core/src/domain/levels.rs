//! 지지/저항 레벨.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 현재가 기준 지지/저항 레벨 묶음.
///
/// 극값이 부족하면 각 레벨은 `None`("N/A")이며, 이는 정상 종료 상태입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelPair {
    /// 현재가보다 낮은 지지 극값 중 최대값
    pub nearest_support: Option<Decimal>,
    /// 현재가보다 높은 저항 극값 중 최소값
    pub nearest_resistance: Option<Decimal>,
    /// 전체 지지 극값 중 최소값 (거래량 상위 캔들로 확장 가능)
    pub strong_support: Option<Decimal>,
    /// 전체 저항 극값 중 최대값 (거래량 상위 캔들로 확장 가능)
    pub strong_resistance: Option<Decimal>,
}

impl LevelPair {
    /// 모든 레벨이 정의되지 않은 상태.
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn is_undefined(&self) -> bool {
        self.nearest_support.is_none()
            && self.nearest_resistance.is_none()
            && self.strong_support.is_none()
            && self.strong_resistance.is_none()
    }
}

/// 레벨 표시용 래퍼 ("N/A" 처리).
pub struct DisplayLevel(pub Option<Decimal>);

impl fmt::Display for DisplayLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v.normalize()),
            None => f.write_str("N/A"),
        }
    }
}
