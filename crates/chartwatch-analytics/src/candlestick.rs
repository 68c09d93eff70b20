//! 캔들스틱 패턴 분류.
//!
//! 최근 1~3개 캔들만 보고 가장 먼저 일치하는 규칙 하나를 반환합니다.
//! 규칙 조건이 서로 겹치므로 평가 순서가 결과를 결정합니다:
//!
//! 1. Doji
//! 2. Hammer / Hanging Man / Inverted Hammer / Shooting Star
//! 3. Engulfing
//! 4. Harami
//! 5. Morning / Evening Star

use chartwatch_core::{CandleSeries, CandlestickKind, Kline};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 캔들스틱 분류에 필요한 최소 캔들 수.
pub const MIN_CANDLE_BARS: usize = 2;

/// 캔들 패턴 임계값.
#[derive(Debug, Clone, Copy)]
pub struct CandleParams {
    /// Doji: 몸통 < 범위 × 이 값
    pub doji_body_ratio: Decimal,
    /// 긴 꼬리: 꼬리 > 몸통 × 이 값
    pub long_shadow_ratio: Decimal,
    /// 반대쪽 짧은 꼬리: 꼬리 < 몸통 × 이 값
    pub short_shadow_ratio: Decimal,
    /// Star 중간 캔들: 몸통 < 첫 캔들 몸통 × 이 값
    pub star_body_ratio: Decimal,
    /// Star 첫 캔들: 몸통 >= 범위 × 이 값 (추세 캔들)
    pub trend_body_ratio: Decimal,
}

impl Default for CandleParams {
    fn default() -> Self {
        Self {
            doji_body_ratio: dec!(0.1),
            long_shadow_ratio: dec!(2),
            short_shadow_ratio: dec!(0.5),
            star_body_ratio: dec!(0.3),
            trend_body_ratio: dec!(0.5),
        }
    }
}

/// 캔들스틱 분류기.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandlestickClassifier {
    params: CandleParams,
}

impl CandlestickClassifier {
    pub fn new(params: CandleParams) -> Self {
        Self { params }
    }

    /// 시계열의 마지막 캔들 기준으로 분류합니다.
    pub fn classify(&self, series: &CandleSeries) -> CandlestickKind {
        self.classify_bars(series.tail(3))
    }

    /// 최근 캔들 슬라이스(오래된 순)로 분류합니다.
    ///
    /// 캔들이 부족한 규칙은 건너뜁니다. 빈 슬라이스는 `None`입니다.
    pub fn classify_bars(&self, bars: &[Kline]) -> CandlestickKind {
        let Some((current, earlier)) = bars.split_last() else {
            return CandlestickKind::None;
        };
        let previous = earlier.last();
        let first = earlier.len().checked_sub(2).map(|i| &earlier[i]);

        if self.is_doji(current) {
            return CandlestickKind::Doji;
        }
        if let Some(kind) = self.shadow_pattern(current) {
            return kind;
        }
        if let Some(prev) = previous {
            if let Some(kind) = engulfing(prev, current) {
                return kind;
            }
            if let Some(kind) = harami(prev, current) {
                return kind;
            }
            if let Some(first) = first {
                if let Some(kind) = self.star(first, prev, current) {
                    return kind;
                }
            }
        }
        CandlestickKind::None
    }

    fn is_doji(&self, bar: &Kline) -> bool {
        bar.body_size() < bar.range() * self.params.doji_body_ratio
    }

    /// 한쪽 꼬리가 몸통의 2배 초과, 반대쪽이 0.5배 미만인 단일 캔들.
    fn shadow_pattern(&self, bar: &Kline) -> Option<CandlestickKind> {
        let body = bar.body_size();
        let long = body * self.params.long_shadow_ratio;
        let short = body * self.params.short_shadow_ratio;
        let (upper, lower) = (bar.upper_shadow(), bar.lower_shadow());

        if lower > long && upper < short {
            if bar.is_bullish() {
                return Some(CandlestickKind::Hammer);
            }
            if bar.is_bearish() {
                return Some(CandlestickKind::HangingMan);
            }
        }
        if upper > long && lower < short {
            if bar.is_bullish() {
                return Some(CandlestickKind::InvertedHammer);
            }
            if bar.is_bearish() {
                return Some(CandlestickKind::ShootingStar);
            }
        }
        None
    }

    /// 추세 캔들 + 작은 몸통 + 첫 캔들 몸통 중앙을 넘는 확인 캔들.
    fn star(&self, first: &Kline, middle: &Kline, last: &Kline) -> Option<CandlestickKind> {
        let first_body = first.body_size();
        if first_body.is_zero() || first_body < first.range() * self.params.trend_body_ratio {
            return None;
        }
        if middle.body_size() >= first_body * self.params.star_body_ratio {
            return None;
        }

        let midpoint = first.body_midpoint();
        if first.is_bearish() && last.is_bullish() && last.close > midpoint {
            return Some(CandlestickKind::MorningStar);
        }
        if first.is_bullish() && last.is_bearish() && last.close < midpoint {
            return Some(CandlestickKind::EveningStar);
        }
        None
    }
}

/// 현재 몸통이 이전 몸통을 감싸며 방향이 반대.
fn engulfing(prev: &Kline, current: &Kline) -> Option<CandlestickKind> {
    if prev.is_bullish()
        && current.is_bearish()
        && current.close < prev.open
        && current.open > prev.close
    {
        return Some(CandlestickKind::BearishEngulfing);
    }
    if prev.is_bearish()
        && current.is_bullish()
        && current.close > prev.open
        && current.open < prev.close
    {
        return Some(CandlestickKind::BullishEngulfing);
    }
    None
}

/// 현재 몸통이 이전 몸통 안에 들어가며 방향이 반대.
fn harami(prev: &Kline, current: &Kline) -> Option<CandlestickKind> {
    if prev.is_bearish()
        && current.is_bullish()
        && current.open > prev.close
        && current.close < prev.open
    {
        return Some(CandlestickKind::BullishHarami);
    }
    if prev.is_bullish()
        && current.is_bearish()
        && current.open < prev.close
        && current.close > prev.open
    {
        return Some(CandlestickKind::BearishHarami);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartwatch_core::Timeframe;
    use chrono::{Duration, TimeZone, Utc};

    fn k(i: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Kline {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(4 * i);
        Kline::new("BTCUSDT", Timeframe::H4, t, open, high, low, close, dec!(1))
    }

    fn classify(bars: &[Kline]) -> CandlestickKind {
        CandlestickClassifier::default().classify_bars(bars)
    }

    #[test]
    fn test_doji() {
        let bar = k(0, dec!(100), dec!(105), dec!(95), dec!(100.5));
        assert_eq!(classify(&[bar]), CandlestickKind::Doji);
    }

    #[test]
    fn test_doji_wins_over_hammer_shape() {
        // 몸통 0.5 / 범위 10 (Doji) 이면서 아랫꼬리 9.4 > 2×몸통, 윗꼬리 0.1 < 0.5×몸통 (Hammer)
        let bar = k(0, dec!(109.4), dec!(110), dec!(100), dec!(109.9));
        let clf = CandlestickClassifier::default();
        assert!(clf.shadow_pattern(&bar).is_some());
        assert_eq!(classify(&[bar]), CandlestickKind::Doji);
    }

    #[test]
    fn test_hammer_family_by_direction() {
        let hammer = k(0, dec!(108), dec!(110.2), dec!(100), dec!(110));
        assert_eq!(classify(&[hammer]), CandlestickKind::Hammer);

        let hanging = k(0, dec!(110), dec!(110.2), dec!(100), dec!(108));
        assert_eq!(classify(&[hanging]), CandlestickKind::HangingMan);

        let inverted = k(0, dec!(100), dec!(110), dec!(99.8), dec!(102));
        assert_eq!(classify(&[inverted]), CandlestickKind::InvertedHammer);

        let shooting = k(0, dec!(102), dec!(110), dec!(99.8), dec!(100));
        assert_eq!(classify(&[shooting]), CandlestickKind::ShootingStar);
    }

    #[test]
    fn test_engulfing() {
        let prev = k(0, dec!(100), dec!(106), dec!(99), dec!(105));
        let cur = k(1, dec!(106), dec!(107), dec!(98), dec!(99));
        assert_eq!(classify(&[prev, cur]), CandlestickKind::BearishEngulfing);

        let prev = k(0, dec!(105), dec!(106), dec!(99), dec!(100));
        let cur = k(1, dec!(99), dec!(107), dec!(98), dec!(106));
        assert_eq!(classify(&[prev, cur]), CandlestickKind::BullishEngulfing);
    }

    #[test]
    fn test_harami() {
        let prev = k(0, dec!(110), dec!(111), dec!(99), dec!(100));
        let cur = k(1, dec!(102), dec!(106), dec!(101), dec!(105));
        assert_eq!(classify(&[prev, cur]), CandlestickKind::BullishHarami);

        let prev = k(0, dec!(100), dec!(111), dec!(99), dec!(110));
        let cur = k(1, dec!(108), dec!(109), dec!(102), dec!(104));
        assert_eq!(classify(&[prev, cur]), CandlestickKind::BearishHarami);
    }

    #[test]
    fn test_morning_and_evening_star() {
        let first = k(0, dec!(110), dec!(111), dec!(99), dec!(100));
        let middle = k(1, dec!(98), dec!(101), dec!(96), dec!(99));
        let last = k(2, dec!(100), dec!(108.5), dec!(99.5), dec!(108));
        assert_eq!(classify(&[first, middle, last]), CandlestickKind::MorningStar);

        let first = k(0, dec!(100), dec!(111), dec!(99), dec!(110));
        let middle = k(1, dec!(111), dec!(113), dec!(110), dec!(112));
        let last = k(2, dec!(110), dec!(110.5), dec!(101.5), dec!(102));
        assert_eq!(classify(&[first, middle, last]), CandlestickKind::EveningStar);
    }

    #[test]
    fn test_no_match_and_empty() {
        // 평범한 양봉: 꼬리가 몸통과 비슷
        let bar = k(0, dec!(100), dec!(108), dec!(97), dec!(105));
        assert_eq!(classify(&[bar]), CandlestickKind::None);
        assert_eq!(classify(&[]), CandlestickKind::None);
    }
}
