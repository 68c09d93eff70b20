//! 추세 추정.
//!
//! 두 가지 방식을 제공합니다:
//! - `ExtremaMeanShift`: 최근 극값(최대 4개)의 앞 2개 평균과 뒤 2개 평균 비교
//! - `SmoothedRegression`: 고가/저가 SMA에 최소제곱 기울기 적용
//!
//! 두 방식 모두 고가와 저가가 같은 방향일 때만 Uptrend/Downtrend이고,
//! 그 외에는 Sideways입니다. 데이터가 부족해도 Sideways입니다.

use chartwatch_core::{CandleSeries, ExtremaSet, TrendDirection, TrendMethod};
use rust_decimal::Decimal;
use tracing::trace;

use crate::error::{require_len, AnalysisError, AnalyticsResult};

/// 평균 이동 방식에서 보는 최근 극값 수.
const MEAN_SHIFT_POINTS: usize = 4;

/// 추세 추정기.
#[derive(Debug, Clone, Copy)]
pub struct TrendEstimator {
    method: TrendMethod,
    /// 회귀 방식의 SMA 창 크기
    window: usize,
}

impl Default for TrendEstimator {
    fn default() -> Self {
        Self {
            method: TrendMethod::ExtremaMeanShift,
            window: 5,
        }
    }
}

impl TrendEstimator {
    /// 창 크기가 0이면 1로 보정합니다.
    pub fn new(method: TrendMethod, window: usize) -> Self {
        Self {
            method,
            window: window.max(1),
        }
    }

    pub fn method(&self) -> TrendMethod {
        self.method
    }

    pub fn estimate(&self, series: &CandleSeries, extrema: &ExtremaSet) -> TrendDirection {
        let direction = match self.method {
            TrendMethod::ExtremaMeanShift => mean_shift(extrema),
            TrendMethod::SmoothedRegression => {
                regression(&series.highs(), &series.lows(), self.window)
            }
        };
        trace!(symbol = series.symbol(), method = ?self.method, %direction, "trend estimated");
        direction
    }
}

fn combine(high: Decimal, low: Decimal) -> TrendDirection {
    if high > Decimal::ZERO && low > Decimal::ZERO {
        TrendDirection::Uptrend
    } else if high < Decimal::ZERO && low < Decimal::ZERO {
        TrendDirection::Downtrend
    } else {
        TrendDirection::Sideways
    }
}

// ==================== 극값 평균 이동 ====================

fn mean_shift(extrema: &ExtremaSet) -> TrendDirection {
    match (
        shift(&extrema.high_prices()),
        shift(&extrema.low_prices()),
    ) {
        (Some(high), Some(low)) => combine(high, low),
        _ => TrendDirection::Sideways,
    }
}

/// 최근 극값들의 뒤 2개 평균 - 앞 2개 평균.
fn shift(prices: &[Decimal]) -> Option<Decimal> {
    let recent = &prices[prices.len().saturating_sub(MEAN_SHIFT_POINTS)..];
    if recent.len() < 2 {
        return None;
    }
    let first = (recent[0] + recent[1]) / Decimal::TWO;
    let n = recent.len();
    let last = (recent[n - 2] + recent[n - 1]) / Decimal::TWO;
    Some(last - first)
}

// ==================== 이동평균 회귀 ====================

fn regression(highs: &[Decimal], lows: &[Decimal], window: usize) -> TrendDirection {
    let slopes = smoothed_slope(highs, window).and_then(|h| Ok((h, smoothed_slope(lows, window)?)));
    match slopes {
        Ok((high, low)) => combine(high, low),
        Err(e) => {
            trace!(error = %e, "trend regression undetermined");
            TrendDirection::Sideways
        }
    }
}

/// SMA 계열의 최소제곱 기울기.
fn smoothed_slope(prices: &[Decimal], window: usize) -> AnalyticsResult<Decimal> {
    let smoothed = sma(prices, window)?;
    slope(&smoothed)
}

/// 단순 이동평균. 결과 길이는 `len - window + 1`입니다.
pub(crate) fn sma(prices: &[Decimal], window: usize) -> AnalyticsResult<Vec<Decimal>> {
    if window == 0 {
        return Err(AnalysisError::InvalidParameter(
            "이동평균 창 크기는 0보다 커야 합니다".to_string(),
        ));
    }
    require_len(prices.len(), window)?;

    let divisor = Decimal::from(window);
    Ok(prices
        .windows(window)
        .map(|w| w.iter().sum::<Decimal>() / divisor)
        .collect())
}

/// 인덱스를 x로 한 최소제곱 기울기. 최소 2개 점이 필요합니다.
pub(crate) fn slope(values: &[Decimal]) -> AnalyticsResult<Decimal> {
    require_len(values.len(), 2)?;

    let n = Decimal::from(values.len());
    let x_mean = Decimal::from(values.len() - 1) / Decimal::TWO;
    let y_mean = values.iter().sum::<Decimal>() / n;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((Decimal::ZERO, Decimal::ZERO), |(num, den), (i, y)| {
            let dx = Decimal::from(i) - x_mean;
            (num + dx * (*y - y_mean), den + dx * dx)
        });

    if den.is_zero() {
        return Err(AnalysisError::Computation("x 분산이 0입니다".to_string()));
    }
    Ok(num / den)
}
