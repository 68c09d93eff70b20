//! 스코어러 인터페이스와 입력 feature.

use chartwatch_core::{ChartPatternKind, ExtremaSet};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{MlError, MlResult};
use crate::error::{relative_change, relative_gap};

/// feature 벡터 길이.
pub const FEATURE_LEN: usize = 8;

/// 극값 집합에서 뽑은 고정 길이 feature.
///
/// | idx | 의미 |
/// |---|---|
/// | 0, 1 | 마지막 두 고가/저가 극값의 변화율 |
/// | 2, 3 | 그 이전 구간의 고가/저가 변화율 (없으면 0) |
/// | 4 | 마지막 고가와 저가 사이 폭 (저가 대비) |
/// | 5, 6 | 마지막 두 고가/저가의 상대 간격 |
/// | 7 | 고가 극값 비중 `highs / (highs + lows)` |
#[derive(Debug, Clone, PartialEq)]
pub struct PatternFeatures {
    values: [f32; FEATURE_LEN],
}

impl PatternFeatures {
    /// 고가/저가 극값이 각각 2개 이상이고 가격이 0이 아닐 때만 생성됩니다.
    pub fn from_extrema(extrema: &ExtremaSet) -> Option<Self> {
        if !extrema.has_at_least(2) {
            return None;
        }
        let h = extrema.high_prices();
        let l = extrema.low_prices();
        let (h1, h2) = (h[h.len() - 2], h[h.len() - 1]);
        let (l1, l2) = (l[l.len() - 2], l[l.len() - 1]);

        let prev_change = |prices: &[Decimal]| -> Option<Decimal> {
            if prices.len() < 3 {
                return Some(Decimal::ZERO);
            }
            relative_change(prices[prices.len() - 3], prices[prices.len() - 2]).ok()
        };

        let raw = [
            relative_change(h1, h2).ok()?,
            relative_change(l1, l2).ok()?,
            prev_change(&h)?,
            prev_change(&l)?,
            relative_change(l2, h2).ok()?,
            relative_gap(h2, h1, h2).ok()?,
            relative_gap(l2, l1, l2).ok()?,
            Decimal::from(h.len()) / Decimal::from(h.len() + l.len()),
        ];

        let mut values = [0.0f32; FEATURE_LEN];
        for (slot, v) in values.iter_mut().zip(raw.iter()) {
            *slot = v.to_f32().unwrap_or(0.0);
        }
        Some(Self { values })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// 스코어러 판정 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPattern {
    pub kind: ChartPatternKind,
    /// 0.0 ~ 1.0
    pub confidence: f64,
}

impl ScoredPattern {
    /// 외부 레이블 문자열을 해석합니다.
    pub fn from_label(label: &str, confidence: f64) -> MlResult<Self> {
        let kind = label
            .parse::<ChartPatternKind>()
            .map_err(|_| MlError::UnknownLabel(label.to_string()))?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(MlError::InvalidInput(format!(
                "confidence out of range: {}",
                confidence
            )));
        }
        Ok(Self { kind, confidence })
    }
}

/// 차트 패턴 스코어러.
///
/// `Ok(None)`은 "판단 없음"이며 에러가 아닙니다.
pub trait PatternScorer: Send + Sync {
    fn score(&self, features: &PatternFeatures) -> MlResult<Option<ScoredPattern>>;

    /// 로깅용 이름.
    fn name(&self) -> &str;
}

/// 고정 결과를 반환하는 스코어러 (모델 파일 없이 테스트/드라이런용).
#[derive(Debug, Default)]
pub struct FixedScorer {
    result: Option<ScoredPattern>,
    calls: AtomicUsize,
}

impl FixedScorer {
    pub fn new(result: Option<ScoredPattern>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    /// 지금까지 호출된 횟수.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PatternScorer for FixedScorer {
    fn score(&self, _features: &PatternFeatures) -> MlResult<Option<ScoredPattern>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
