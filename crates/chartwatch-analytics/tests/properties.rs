//! 분석 컴포넌트 속성 테스트.

use chartwatch_analytics::{
    ChartPatternClassifier, ExtremaDetector, LevelCalculator, TrendEstimator,
};
use chartwatch_core::{
    BreakoutKind, BreakoutState, CandleSeries, ExtremaSet, Kline, LevelPair, Timeframe,
    TrendDirection, TrendMethod,
};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn series_from(values: &[u32]) -> CandleSeries {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let bars = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let v = Decimal::from(*v);
            Kline::new(
                "BTCUSDT",
                Timeframe::H1,
                t0 + Duration::hours(i as i64),
                v,
                v + dec!(2),
                v - dec!(1),
                v,
                Decimal::from(i as u32 % 7 + 1),
            )
        })
        .collect();
    CandleSeries::new("BTCUSDT", Timeframe::H1, bars).unwrap()
}

fn prices() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(10u32..1000, 1..80)
}

proptest! {
    #[test]
    fn extrema_empty_below_window(order in 1usize..6, values in prices()) {
        let detector = ExtremaDetector::new(order).unwrap();
        let series = series_from(&values);
        let set = detector.detect(&series);

        if values.len() < 2 * order + 1 {
            prop_assert!(set.is_empty());
        }
        for e in &set.highs {
            prop_assert!(e.index >= order && e.index + order < values.len());
        }
        for e in &set.lows {
            prop_assert!(e.index >= order && e.index + order < values.len());
        }
    }

    #[test]
    fn nearest_levels_straddle_price(values in prices(), price in 10u32..1000) {
        let series = series_from(&values);
        let extrema = ExtremaDetector::new(2).unwrap().detect(&series);
        let price = Decimal::from(price);
        let levels = LevelCalculator::default().calculate(price, &extrema, Some(&series));

        if let Some(support) = levels.nearest_support {
            prop_assert!(support < price);
        }
        if let Some(resistance) = levels.nearest_resistance {
            prop_assert!(resistance > price);
        }
        if let (Some(strong), Some(near)) = (levels.strong_support, levels.nearest_support) {
            prop_assert!(strong <= near);
        }
        if let (Some(strong), Some(near)) = (levels.strong_resistance, levels.nearest_resistance) {
            prop_assert!(strong >= near);
        }
    }

    #[test]
    fn classifier_similarity_in_range(values in prices()) {
        let series = series_from(&values);
        let extrema = ExtremaDetector::new(1).unwrap().detect(&series);
        let pattern = ChartPatternClassifier::default().classify(&extrema);

        prop_assert!((0.0..=100.0).contains(&pattern.similarity));
        if pattern.is_none() {
            prop_assert_eq!(pattern.similarity, 0.0);
        }
    }

    #[test]
    fn breakout_alerts_never_repeat_direction(ticks in prop::collection::vec(80u32..120, 1..60)) {
        let levels = LevelPair {
            nearest_support: Some(dec!(95)),
            nearest_resistance: Some(dec!(105)),
            strong_support: Some(dec!(90)),
            strong_resistance: Some(dec!(110)),
        };
        let mut state = BreakoutState::neutral();
        let mut last: Option<BreakoutKind> = None;

        for tick in ticks {
            if let Some(alert) = state.on_price("BTCUSDT", Decimal::from(tick), &levels) {
                prop_assert_ne!(Some(alert.kind), last);
                last = Some(alert.kind);
            }
            prop_assert!(!(state.support_broken && state.resistance_broken));
        }

        state.reset();
        prop_assert!(state.is_neutral());
        prop_assert_eq!(state, BreakoutState::neutral());
    }

    #[test]
    fn flat_series_is_sideways(value in 10u32..1000, len in 1usize..60, window in 1usize..10) {
        let series = series_from(&vec![value; len]);
        let extrema = ExtremaDetector::new(1).unwrap().detect(&series);

        for method in [TrendMethod::ExtremaMeanShift, TrendMethod::SmoothedRegression] {
            let trend = TrendEstimator::new(method, window).estimate(&series, &extrema);
            prop_assert_eq!(trend, TrendDirection::Sideways);
        }
    }
}

#[test]
fn empty_extrema_give_no_pattern() {
    let pattern = ChartPatternClassifier::default().classify(&ExtremaSet::default());
    assert!(pattern.is_none());
}
