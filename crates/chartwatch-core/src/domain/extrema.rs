//! 국소 극값 집합.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 시계열 상의 극값 하나.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extremum {
    /// 시계열 내 캔들 인덱스
    pub index: usize,
    pub price: Decimal,
}

impl Extremum {
    pub fn new(index: usize, price: Decimal) -> Self {
        Self { index, price }
    }
}

/// 고가 극대값(저항 후보)과 저가 극소값(지지 후보).
///
/// 두 시퀀스 모두 인덱스 오름차순입니다. 분석 패스마다 새로 계산되며
/// 제자리에서 수정되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremaSet {
    pub highs: Vec<Extremum>,
    pub lows: Vec<Extremum>,
}

impl ExtremaSet {
    pub fn new(highs: Vec<Extremum>, lows: Vec<Extremum>) -> Self {
        Self { highs, lows }
    }

    /// 가격 목록으로부터 생성합니다 (인덱스는 순번).
    ///
    /// 분류기를 시계열 없이 직접 시험할 때 사용합니다.
    pub fn from_prices(highs: &[Decimal], lows: &[Decimal]) -> Self {
        let to_points = |prices: &[Decimal]| {
            prices
                .iter()
                .enumerate()
                .map(|(i, p)| Extremum::new(i, *p))
                .collect()
        };
        Self {
            highs: to_points(highs),
            lows: to_points(lows),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }

    pub fn high_prices(&self) -> Vec<Decimal> {
        self.highs.iter().map(|e| e.price).collect()
    }

    pub fn low_prices(&self) -> Vec<Decimal> {
        self.lows.iter().map(|e| e.price).collect()
    }

    /// 양방향 모두 최소 `n`개 이상인지.
    pub fn has_at_least(&self, n: usize) -> bool {
        self.highs.len() >= n && self.lows.len() >= n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_prices() {
        let set = ExtremaSet::from_prices(&[dec!(100), dec!(101)], &[dec!(90)]);
        assert_eq!(set.highs[1], Extremum::new(1, dec!(101)));
        assert_eq!(set.low_prices(), vec![dec!(90)]);
        assert!(!set.has_at_least(2));
        assert!(set.has_at_least(1));
        assert!(ExtremaSet::default().is_empty());
    }
}
