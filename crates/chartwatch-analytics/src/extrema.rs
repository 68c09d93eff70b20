//! 국소 극값 탐지.
//!
//! 인덱스 `i`(`k <= i < n - k`)의 고가가 `[i-k, i+k]` 범위의 다른 모든 고가보다
//! 엄격하게 크면 극대값, 저가가 엄격하게 작으면 극소값입니다.
//! 같은 값이 이웃에 있으면 극값이 아닙니다 (평탄 구간 제외).

use chartwatch_core::{CandleSeries, Extremum, ExtremaSet};
use rust_decimal::Decimal;

use crate::error::{AnalysisError, AnalyticsResult};

/// 기본 이웃 범위.
pub const DEFAULT_ORDER: usize = 5;

/// 극값 탐지기.
#[derive(Debug, Clone, Copy)]
pub struct ExtremaDetector {
    order: usize,
}

impl Default for ExtremaDetector {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
        }
    }
}

impl ExtremaDetector {
    /// 이웃 범위 `order`(k)로 생성합니다. k는 1 이상이어야 합니다.
    pub fn new(order: usize) -> AnalyticsResult<Self> {
        if order == 0 {
            return Err(AnalysisError::InvalidParameter(
                "극값 이웃 범위는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(Self { order })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// 극값 탐지에 필요한 최소 캔들 수 (`2k + 1`).
    pub fn min_len(&self) -> usize {
        2 * self.order + 1
    }

    /// 시계열의 고가 극대값과 저가 극소값을 찾습니다.
    ///
    /// 시계열이 `2k + 1`보다 짧으면 빈 집합을 반환합니다.
    pub fn detect(&self, series: &CandleSeries) -> ExtremaSet {
        self.detect_prices(&series.highs(), &series.lows())
    }

    /// 가격 배열에서 직접 탐지합니다.
    pub fn detect_prices(&self, highs: &[Decimal], lows: &[Decimal]) -> ExtremaSet {
        ExtremaSet::new(
            local_extrema(highs, self.order, |center, other| center > other),
            local_extrema(lows, self.order, |center, other| center < other),
        )
    }
}

fn local_extrema<F>(values: &[Decimal], k: usize, beats: F) -> Vec<Extremum>
where
    F: Fn(Decimal, Decimal) -> bool,
{
    let n = values.len();
    if n < 2 * k + 1 {
        return Vec::new();
    }

    (k..n - k)
        .filter(|&i| {
            let center = values[i];
            (i - k..=i + k)
                .filter(|&j| j != i)
                .all(|j| beats(center, values[j]))
        })
        .map(|i| Extremum::new(i, values[i]))
        .collect()
}
