//! 지지/저항 레벨 계산.
//!
//! - 가까운 저항: 현재가보다 큰 고가 극대값 중 최소
//! - 가까운 지지: 현재가보다 작은 저가 극소값 중 최대
//! - 강한 저항/지지: 전체 극값의 최대/최소. 거래량 확장을 켜면 거래량 상위 2개 캔들의
//!   고가/저가와 비교하여 더 극단적인 값을 사용합니다.
//!
//! 동일한 값은 수치 비교만으로 처리하며 별도의 동률 규칙은 없습니다.
//! 거래량 상위 캔들 선정 시에는 먼저 나온 캔들이 우선합니다.

use chartwatch_core::{CandleSeries, ExtremaSet, LevelPair};
use rust_decimal::Decimal;

/// 강한 레벨 확장에 사용할 거래량 상위 캔들 수.
pub const VOLUME_WIDENING_BARS: usize = 2;

/// 지지/저항 계산기.
#[derive(Debug, Clone, Copy)]
pub struct LevelCalculator {
    volume_widening: bool,
}

impl Default for LevelCalculator {
    fn default() -> Self {
        Self {
            volume_widening: true,
        }
    }
}

impl LevelCalculator {
    pub fn new(volume_widening: bool) -> Self {
        Self { volume_widening }
    }

    /// 현재가와 극값으로 레벨을 계산합니다.
    ///
    /// `series`가 주어지고 거래량 확장이 켜져 있으면 강한 레벨을 확장합니다.
    /// 극값이 없는 방향의 강한 레벨은 확장하지 않고 `None`으로 둡니다.
    pub fn calculate(
        &self,
        price: Decimal,
        extrema: &ExtremaSet,
        series: Option<&CandleSeries>,
    ) -> LevelPair {
        let resistances = extrema.high_prices();
        let supports = extrema.low_prices();

        let nearest_resistance = resistances.iter().copied().filter(|r| *r > price).min();
        let nearest_support = supports.iter().copied().filter(|s| *s < price).max();

        let mut strong_resistance = resistances.iter().copied().max();
        let mut strong_support = supports.iter().copied().min();

        if let (true, Some(series)) = (self.volume_widening, series) {
            let (top_high, top_low) = volume_extremes(series);
            strong_resistance = strong_resistance.map(|r| top_high.map_or(r, |h| r.max(h)));
            strong_support = strong_support.map(|s| top_low.map_or(s, |l| s.min(l)));
        }

        LevelPair {
            nearest_support,
            nearest_resistance,
            strong_support,
            strong_resistance,
        }
    }
}

/// 거래량 상위 캔들들의 (최고 고가, 최저 저가).
fn volume_extremes(series: &CandleSeries) -> (Option<Decimal>, Option<Decimal>) {
    let mut ranked: Vec<(usize, Decimal)> = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, b)| (i, b.volume))
        .collect();
    // 안정 정렬: 거래량이 같으면 먼저 나온 캔들 우선
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let top = ranked
        .iter()
        .take(VOLUME_WIDENING_BARS)
        .map(|(i, _)| &series.bars()[*i]);

    top.fold((None, None), |(hi, lo): (Option<Decimal>, Option<Decimal>), bar| {
        (
            Some(hi.map_or(bar.high, |h| h.max(bar.high))),
            Some(lo.map_or(bar.low, |l| l.min(bar.low))),
        )
    })
}
