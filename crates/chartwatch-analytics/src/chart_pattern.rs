//! 차트 패턴 분류.
//!
//! 극값 시퀀스의 마지막 2~3개 원소만 보는 독립적인 규칙들로 구성된 고정 카탈로그를
//! 평가합니다. 규칙은 모두 상대 변화율로 표현되며, 기준 허용오차 `tol`(기본 2%)에 대해:
//!
//! - 평탄: `|x| < tol`, 상승: `x >= tol`, 하락: `x <= -tol`
//! - 평행: 두 변화율의 차이 `< tol / 2`
//!
//! 유사도는 규칙 일치 시 90이며, Double Top/Bottom은 `(1 - 상대간격) × 100`을 사용합니다.
//!
//! 선택 정책:
//! - `FirstMatch`: 카탈로그 순서상 첫 일치 (기본값)
//! - `BestSimilarity`: 최고 유사도, 동률은 카탈로그 순서
//!
//! 어떤 규칙도 일치하지 않을 때만 스코어러(있다면)를 참조합니다.

use chartwatch_core::{
    ChartPatternKind, Extremum, ExtremaSet, PatternMatch, PatternSource, SelectionPolicy,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{relative_change, relative_gap};
use crate::ml::{PatternFeatures, PatternScorer};

/// 차트 패턴 탐지에 필요한 최소 캔들 수.
pub const MIN_PATTERN_BARS: usize = 20;

/// 차트 패턴 분류 설정.
#[derive(Debug, Clone)]
pub struct ChartPatternConfig {
    /// 같은 가격 레벨로 보는 상대 오차
    pub price_tolerance: Decimal,
    /// 깃발/페넌트의 깃대 최소 변화율
    pub pole_threshold: Decimal,
    /// V자 반전의 양쪽 다리 최소 변화율
    pub sharp_move: Decimal,
    /// 규칙 일치 시 유사도
    pub rule_similarity: f64,
    pub policy: SelectionPolicy,
}

impl Default for ChartPatternConfig {
    fn default() -> Self {
        Self {
            price_tolerance: dec!(0.02),
            pole_threshold: dec!(0.05),
            sharp_move: dec!(0.06),
            rule_similarity: 90.0,
            policy: SelectionPolicy::FirstMatch,
        }
    }
}

impl ChartPatternConfig {
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// 규칙 하나가 일치했을 때의 기하 정보.
#[derive(Debug, Clone, Copy)]
struct Hit {
    similarity: f64,
    key_level: Decimal,
    low: Decimal,
    high: Decimal,
}

/// 차트 패턴 분류기.
#[derive(Clone, Default)]
pub struct ChartPatternClassifier {
    config: ChartPatternConfig,
    scorer: Option<Arc<dyn PatternScorer>>,
}

impl std::fmt::Debug for ChartPatternClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartPatternClassifier")
            .field("config", &self.config)
            .field("scorer", &self.scorer.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl ChartPatternClassifier {
    pub fn new(config: ChartPatternConfig) -> Self {
        Self {
            config,
            scorer: None,
        }
    }

    /// 보조 스코어러를 연결합니다.
    pub fn with_scorer(mut self, scorer: Arc<dyn PatternScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn config(&self) -> &ChartPatternConfig {
        &self.config
    }

    /// 정책에 따라 하나의 패턴을 선택합니다.
    ///
    /// 고가/저가 극값이 각각 2개 미만이면 `PatternMatch::none()`입니다.
    pub fn classify(&self, extrema: &ExtremaSet) -> PatternMatch {
        if !extrema.has_at_least(2) {
            return PatternMatch::none();
        }
        let geometry = Geometry::new(extrema, &self.config);

        let selected = match self.config.policy {
            SelectionPolicy::FirstMatch => ChartPatternKind::CATALOGUE
                .iter()
                .find_map(|kind| geometry.check(*kind).map(|hit| (*kind, hit))),
            SelectionPolicy::BestSimilarity => ChartPatternKind::CATALOGUE
                .iter()
                .filter_map(|kind| geometry.check(*kind).map(|hit| (*kind, hit)))
                // 동률이면 먼저 나온 패턴 유지
                .fold(None, |best: Option<(ChartPatternKind, Hit)>, cand| match best {
                    Some(b) if b.1.similarity >= cand.1.similarity => Some(b),
                    _ => Some(cand),
                }),
        };

        match selected {
            Some((kind, hit)) => to_match(kind, hit),
            None => self.consult_scorer(extrema),
        }
    }

    /// 일치하는 모든 규칙을 카탈로그 순서로 반환합니다 (스코어러 제외).
    pub fn evaluate_all(&self, extrema: &ExtremaSet) -> Vec<PatternMatch> {
        if !extrema.has_at_least(2) {
            return Vec::new();
        }
        let geometry = Geometry::new(extrema, &self.config);
        ChartPatternKind::CATALOGUE
            .iter()
            .filter_map(|kind| geometry.check(*kind).map(|hit| to_match(*kind, hit)))
            .collect()
    }

    fn consult_scorer(&self, extrema: &ExtremaSet) -> PatternMatch {
        let Some(scorer) = &self.scorer else {
            return PatternMatch::none();
        };
        let Some(features) = PatternFeatures::from_extrema(extrema) else {
            return PatternMatch::none();
        };

        match scorer.score(&features) {
            Ok(Some(scored)) => {
                debug!(
                    scorer = scorer.name(),
                    pattern = %scored.kind,
                    confidence = scored.confidence,
                    "scorer matched"
                );
                let last_high = extrema.highs.last().map(|e| e.price);
                let last_low = extrema.lows.last().map(|e| e.price);
                PatternMatch {
                    kind: scored.kind,
                    similarity: (scored.confidence * 100.0).clamp(0.0, 100.0),
                    trend: scored.kind.implied_trend(),
                    key_level: None,
                    pattern_low: last_low,
                    pattern_high: last_high,
                    source: PatternSource::Scorer,
                }
            }
            Ok(None) => PatternMatch::none(),
            Err(e) => {
                warn!(scorer = scorer.name(), error = %e, "pattern scorer failed");
                PatternMatch::none()
            }
        }
    }
}

fn to_match(kind: ChartPatternKind, hit: Hit) -> PatternMatch {
    PatternMatch {
        kind,
        similarity: hit.similarity.clamp(0.0, 100.0),
        trend: kind.implied_trend(),
        key_level: Some(hit.key_level),
        pattern_low: Some(hit.low.min(hit.high)),
        pattern_high: Some(hit.high.max(hit.low)),
        source: PatternSource::Rule,
    }
}

// ==================== 규칙 평가 ====================

/// 규칙 평가에 쓰는 극값 꼬리와 허용오차.
struct Geometry<'a> {
    highs: &'a [Extremum],
    lows: &'a [Extremum],
    tol: Decimal,
    pole: Decimal,
    sharp: Decimal,
    rule_similarity: f64,
}

impl<'a> Geometry<'a> {
    fn new(extrema: &'a ExtremaSet, config: &ChartPatternConfig) -> Self {
        Self {
            highs: &extrema.highs,
            lows: &extrema.lows,
            tol: config.price_tolerance,
            pole: config.pole_threshold,
            sharp: config.sharp_move,
            rule_similarity: config.rule_similarity,
        }
    }

    /// 끝에서 `back`번째 고가 극값 (1 = 마지막).
    fn high(&self, back: usize) -> Option<Extremum> {
        self.highs.len().checked_sub(back).map(|i| self.highs[i])
    }

    fn low(&self, back: usize) -> Option<Extremum> {
        self.lows.len().checked_sub(back).map(|i| self.lows[i])
    }

    /// 마지막 두 고가의 변화율.
    fn high_change(&self) -> Option<Decimal> {
        relative_change(self.high(2)?.price, self.high(1)?.price).ok()
    }

    fn low_change(&self) -> Option<Decimal> {
        relative_change(self.low(2)?.price, self.low(1)?.price).ok()
    }

    fn flat(&self, x: Decimal) -> bool {
        x.abs() < self.tol
    }

    fn rising(&self, x: Decimal) -> bool {
        x >= self.tol
    }

    fn falling(&self, x: Decimal) -> bool {
        x <= -self.tol
    }

    fn parallel(&self, a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < self.tol / Decimal::TWO
    }

    /// 두 인덱스 사이 저가 극값의 최소 (없으면 마지막 저가).
    fn neckline_low(&self, from: usize, to: usize) -> Option<Decimal> {
        self.lows
            .iter()
            .filter(|e| e.index > from && e.index < to)
            .map(|e| e.price)
            .min()
            .or_else(|| self.low(1).map(|e| e.price))
    }

    /// 두 인덱스 사이 고가 극값의 최대 (없으면 마지막 고가).
    fn neckline_high(&self, from: usize, to: usize) -> Option<Decimal> {
        self.highs
            .iter()
            .filter(|e| e.index > from && e.index < to)
            .map(|e| e.price)
            .max()
            .or_else(|| self.high(1).map(|e| e.price))
    }

    fn hit(&self, key_level: Decimal, low: Decimal, high: Decimal) -> Hit {
        Hit {
            similarity: self.rule_similarity,
            key_level,
            low,
            high,
        }
    }

    fn check(&self, kind: ChartPatternKind) -> Option<Hit> {
        use ChartPatternKind as K;
        match kind {
            K::DoubleTop => self.double_top(),
            K::DoubleBottom => self.double_bottom(),
            K::TripleTop => self.triple_top(),
            K::TripleBottom => self.triple_bottom(),
            K::HeadAndShoulders => self.head_and_shoulders(),
            K::InverseHeadAndShoulders => self.inverse_head_and_shoulders(),
            K::VTop => self.v_top(),
            K::VBottom => self.v_bottom(),
            K::RoundingTop => self.rounding_top(),
            K::RoundingBottom => self.rounding_bottom(),
            K::BullFlag => self.bull_continuation(false),
            K::BearFlag => self.bear_continuation(false),
            K::BullPennant => self.bull_continuation(true),
            K::BearPennant => self.bear_continuation(true),
            K::RisingWedge => self.rising_wedge(),
            K::FallingWedge => self.falling_wedge(),
            K::AscendingTriangle => self.ascending_triangle(),
            K::DescendingTriangle => self.descending_triangle(),
            K::SymmetricalTriangle => self.symmetrical_triangle(),
            K::AscendingChannel => self.ascending_channel(),
            K::DescendingChannel => self.descending_channel(),
            K::HorizontalChannel => self.horizontal_channel(),
            K::BroadeningFormation => self.broadening(),
            K::None => None,
        }
    }

    // ---- 이중/삼중 천장·바닥 ----

    /// `|h[-1] - h[-2]| / h[-1] < tol`
    fn double_top(&self) -> Option<Hit> {
        let (h1, h2) = (self.high(2)?, self.high(1)?);
        let gap = relative_gap(h2.price, h1.price, h2.price).ok()?;
        if gap >= self.tol {
            return None;
        }
        let neckline = self.neckline_low(h1.index, h2.index)?;
        Some(Hit {
            similarity: closeness(gap),
            key_level: neckline,
            low: neckline,
            high: h1.price.max(h2.price),
        })
    }

    /// `|l[-1] - l[-2]| / l[-1] < tol`
    fn double_bottom(&self) -> Option<Hit> {
        let (l1, l2) = (self.low(2)?, self.low(1)?);
        let gap = relative_gap(l2.price, l1.price, l2.price).ok()?;
        if gap >= self.tol {
            return None;
        }
        let neckline = self.neckline_high(l1.index, l2.index)?;
        Some(Hit {
            similarity: closeness(gap),
            key_level: neckline,
            low: l1.price.min(l2.price),
            high: neckline,
        })
    }

    /// 마지막 세 고가가 평균에서 모두 `tol` 이내.
    fn triple_top(&self) -> Option<Hit> {
        let (h0, h1, h2) = (self.high(3)?, self.high(2)?, self.high(1)?);
        let prices = [h0.price, h1.price, h2.price];
        if !self.clustered(&prices) {
            return None;
        }
        let neckline = self.neckline_low(h0.index, h2.index)?;
        Some(self.hit(neckline, neckline, max3(prices)))
    }

    fn triple_bottom(&self) -> Option<Hit> {
        let (l0, l1, l2) = (self.low(3)?, self.low(2)?, self.low(1)?);
        let prices = [l0.price, l1.price, l2.price];
        if !self.clustered(&prices) {
            return None;
        }
        let neckline = self.neckline_high(l0.index, l2.index)?;
        Some(self.hit(neckline, min3(prices), neckline))
    }

    fn clustered(&self, prices: &[Decimal; 3]) -> bool {
        let mean = (prices[0] + prices[1] + prices[2]) / Decimal::from(3);
        prices
            .iter()
            .all(|p| matches!(relative_gap(*p, mean, mean), Ok(g) if g < self.tol))
    }

    // ---- 머리어깨형 ----

    /// 가운데 고가(머리)가 양 어깨보다 `tol` 이상 높고, 두 어깨는 `tol` 이내.
    fn head_and_shoulders(&self) -> Option<Hit> {
        let (ls, head, rs) = (self.high(3)?, self.high(2)?, self.high(1)?);
        let shoulder = ls.price.max(rs.price);
        let head_lift = relative_change(shoulder, head.price).ok()?;
        let shoulder_gap = relative_gap(ls.price, rs.price, shoulder).ok()?;
        if !self.rising(head_lift) || shoulder_gap >= self.tol {
            return None;
        }
        let neckline = self.neckline_low(ls.index, rs.index)?;
        Some(self.hit(neckline, neckline, head.price))
    }

    fn inverse_head_and_shoulders(&self) -> Option<Hit> {
        let (ls, head, rs) = (self.low(3)?, self.low(2)?, self.low(1)?);
        let shoulder = ls.price.min(rs.price);
        let head_drop = relative_change(shoulder, head.price).ok()?;
        let shoulder_gap = relative_gap(ls.price, rs.price, shoulder).ok()?;
        if !self.falling(head_drop) || shoulder_gap >= self.tol {
            return None;
        }
        let neckline = self.neckline_high(ls.index, rs.index)?;
        Some(self.hit(neckline, head.price, neckline))
    }

    // ---- V자 / 라운딩 반전 ----

    /// 급등 후 급락: 양쪽 다리 모두 `sharp_move` 이상.
    fn v_top(&self) -> Option<Hit> {
        let (h0, h1, h2) = (self.high(3)?, self.high(2)?, self.high(1)?);
        let rise = relative_change(h0.price, h1.price).ok()?;
        let fall = relative_change(h1.price, h2.price).ok()?;
        if rise < self.sharp || fall > -self.sharp {
            return None;
        }
        Some(self.hit(h1.price, h0.price.min(h2.price), h1.price))
    }

    fn v_bottom(&self) -> Option<Hit> {
        let (l0, l1, l2) = (self.low(3)?, self.low(2)?, self.low(1)?);
        let drop = relative_change(l0.price, l1.price).ok()?;
        let rebound = relative_change(l1.price, l2.price).ok()?;
        if drop > -self.sharp || rebound < self.sharp {
            return None;
        }
        Some(self.hit(l1.price, l1.price, l0.price.max(l2.price)))
    }

    /// 완만하고 대칭적인 상승 후 하락.
    fn rounding_top(&self) -> Option<Hit> {
        let (h0, h1, h2) = (self.high(3)?, self.high(2)?, self.high(1)?);
        let rise = relative_change(h0.price, h1.price).ok()?;
        let fall = relative_change(h1.price, h2.price).ok()?;
        let gentle = rise > Decimal::ZERO
            && rise < self.sharp
            && fall < Decimal::ZERO
            && fall > -self.sharp;
        if !gentle || !self.flat(rise + fall) {
            return None;
        }
        let base = self.neckline_low(h0.index, h2.index)?;
        Some(self.hit(base, base, h1.price))
    }

    fn rounding_bottom(&self) -> Option<Hit> {
        let (l0, l1, l2) = (self.low(3)?, self.low(2)?, self.low(1)?);
        let drop = relative_change(l0.price, l1.price).ok()?;
        let rise = relative_change(l1.price, l2.price).ok()?;
        let gentle = drop < Decimal::ZERO
            && drop > -self.sharp
            && rise > Decimal::ZERO
            && rise < self.sharp;
        if !gentle || !self.flat(drop + rise) {
            return None;
        }
        let rim = self.neckline_high(l0.index, l2.index)?;
        Some(self.hit(rim, l1.price, rim))
    }

    // ---- 깃발 / 페넌트 ----

    /// 상승 깃대(저가[-3] → 고가[-2], `pole_threshold` 이상) 뒤의 조정.
    ///
    /// - 깃발: 고가·저가 모두 완만히 하락하며 평행
    /// - 페넌트: 고가는 하락, 저가는 상승 (수렴)
    fn bull_continuation(&self, pennant: bool) -> Option<Hit> {
        let (base, h1, h2) = (self.low(3)?, self.high(2)?, self.high(1)?);
        let l2 = self.low(1)?;
        if base.index >= h1.index {
            return None;
        }
        let pole = relative_change(base.price, h1.price).ok()?;
        if pole < self.pole {
            return None;
        }
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        let shaped = if pennant {
            hc < Decimal::ZERO && lc > Decimal::ZERO
        } else {
            hc < Decimal::ZERO
                && lc < Decimal::ZERO
                && hc > -self.pole
                && lc > -self.pole
                && self.parallel(hc, lc)
        };
        if !shaped {
            return None;
        }
        Some(self.hit(h2.price, l2.price, h1.price))
    }

    /// 하락 깃대(고가[-3] → 저가[-2]) 뒤의 조정.
    fn bear_continuation(&self, pennant: bool) -> Option<Hit> {
        let (top, l1, l2) = (self.high(3)?, self.low(2)?, self.low(1)?);
        let h2 = self.high(1)?;
        if top.index >= l1.index {
            return None;
        }
        let pole = relative_change(top.price, l1.price).ok()?;
        if pole > -self.pole {
            return None;
        }
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        let shaped = if pennant {
            hc < Decimal::ZERO && lc > Decimal::ZERO
        } else {
            hc > Decimal::ZERO
                && lc > Decimal::ZERO
                && hc < self.pole
                && lc < self.pole
                && self.parallel(hc, lc)
        };
        if !shaped {
            return None;
        }
        Some(self.hit(l2.price, l1.price, h2.price))
    }

    // ---- 쐐기 / 삼각형 / 채널 / 확산 ----

    fn last_pair(&self) -> Option<(Decimal, Decimal, Decimal, Decimal)> {
        Some((
            self.high(2)?.price,
            self.high(1)?.price,
            self.low(2)?.price,
            self.low(1)?.price,
        ))
    }

    /// 고가·저가 모두 상승, 저가가 더 빠르게 상승 (수렴).
    fn rising_wedge(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.rising(hc) && self.rising(lc) && lc - hc >= self.tol / Decimal::TWO) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(l2, l1.min(l2), h1.max(h2)))
    }

    /// 고가·저가 모두 하락, 고가가 더 빠르게 하락 (수렴).
    fn falling_wedge(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.falling(hc) && self.falling(lc) && lc - hc >= self.tol / Decimal::TWO) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(h2, l1.min(l2), h1.max(h2)))
    }

    fn ascending_triangle(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.flat(hc) && self.rising(lc)) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(h1.max(h2), l1.min(l2), h1.max(h2)))
    }

    fn descending_triangle(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.falling(hc) && self.flat(lc)) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(l1.min(l2), l1.min(l2), h1.max(h2)))
    }

    fn symmetrical_triangle(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.falling(hc) && self.rising(lc)) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(h2, l1.min(l2), h1.max(h2)))
    }

    fn ascending_channel(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.rising(hc) && self.rising(lc) && self.parallel(hc, lc)) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(l2, l1.min(l2), h1.max(h2)))
    }

    fn descending_channel(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.falling(hc) && self.falling(lc) && self.parallel(hc, lc)) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(h2, l1.min(l2), h1.max(h2)))
    }

    fn horizontal_channel(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.flat(hc) && self.flat(lc)) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(h1.max(h2), l1.min(l2), h1.max(h2)))
    }

    /// 고가는 상승, 저가는 하락 (확산).
    fn broadening(&self) -> Option<Hit> {
        let (hc, lc) = (self.high_change()?, self.low_change()?);
        if !(self.rising(hc) && self.falling(lc)) {
            return None;
        }
        let (h1, h2, l1, l2) = self.last_pair()?;
        Some(self.hit(h2, l1.min(l2), h1.max(h2)))
    }
}

/// `(1 - gap) × 100`.
fn closeness(gap: Decimal) -> f64 {
    ((Decimal::ONE - gap) * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}

fn max3(p: [Decimal; 3]) -> Decimal {
    p[0].max(p[1]).max(p[2])
}

fn min3(p: [Decimal; 3]) -> Decimal {
    p[0].min(p[1]).min(p[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{FixedScorer, ScoredPattern};
    use chartwatch_core::PatternTrend;

    fn classify(highs: &[Decimal], lows: &[Decimal]) -> PatternMatch {
        ChartPatternClassifier::default().classify(&ExtremaSet::from_prices(highs, lows))
    }

    fn interleaved(highs: &[Decimal], lows: &[Decimal]) -> ExtremaSet {
        // 저가와 고가를 번갈아 배치: l0(0) h0(1) l1(2) h1(3) ...
        ExtremaSet::new(
            highs
                .iter()
                .enumerate()
                .map(|(i, p)| Extremum::new(2 * i + 1, *p))
                .collect(),
            lows.iter()
                .enumerate()
                .map(|(i, p)| Extremum::new(2 * i, *p))
                .collect(),
        )
    }

    #[test]
    fn test_insufficient_extrema_is_none() {
        let m = classify(&[dec!(100)], &[dec!(90), dec!(91)]);
        assert!(m.is_none());
        assert_eq!(m.similarity, 0.0);
        assert_eq!(m.trend, PatternTrend::Unknown);
    }

    #[test]
    fn test_double_top_wins_over_double_bottom() {
        let m = classify(&[dec!(100), dec!(100.5)], &[dec!(90), dec!(92)]);

        assert_eq!(m.kind, ChartPatternKind::DoubleTop);
        assert_eq!(m.trend, PatternTrend::Bearish);
        // gap = 0.5 / 100.5
        let expected = (1.0 - 0.5 / 100.5) * 100.0;
        assert!((m.similarity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_double_top_neckline_between_peaks() {
        let set = interleaved(&[dec!(100), dec!(100.5)], &[dec!(90), dec!(93), dec!(95)]);
        let m = ChartPatternClassifier::default().classify(&set);
        assert_eq!(m.kind, ChartPatternKind::DoubleTop);
        // 고가 인덱스 1, 3 사이의 저가는 인덱스 2 (93)
        assert_eq!(m.key_level, Some(dec!(93)));
        assert_eq!(m.pattern_high, Some(dec!(100.5)));
    }

    #[test]
    fn test_double_bottom() {
        let m = classify(&[dec!(100), dec!(110)], &[dec!(90), dec!(90.9)]);
        assert_eq!(m.kind, ChartPatternKind::DoubleBottom);
        assert_eq!(m.trend, PatternTrend::Bullish);
        assert!(m.similarity > 99.0);
    }

    #[test]
    fn test_head_and_shoulders() {
        let set = interleaved(
            &[dec!(100), dec!(110), dec!(101)],
            &[dec!(90), dec!(95), dec!(94), dec!(85)],
        );
        let m = ChartPatternClassifier::default().classify(&set);
        assert_eq!(m.kind, ChartPatternKind::HeadAndShoulders);
        // 어깨(인덱스 1, 5) 사이 저가 최소값
        assert_eq!(m.key_level, Some(dec!(94)));
        assert_eq!(m.pattern_high, Some(dec!(110)));
    }

    #[test]
    fn test_inverse_head_and_shoulders() {
        let set = interleaved(
            &[dec!(120), dec!(110), dec!(100)],
            &[dec!(100), dec!(90), dec!(99)],
        );
        let m = ChartPatternClassifier::default().classify(&set);
        assert_eq!(m.kind, ChartPatternKind::InverseHeadAndShoulders);
        assert_eq!(m.trend, PatternTrend::Bullish);
    }

    #[test]
    fn test_v_top() {
        let m = classify(
            &[dec!(100), dec!(110), dec!(100.5)],
            &[dec!(80), dec!(85), dec!(70)],
        );
        // 어깨 간격 0.5% 이므로 H&S가 먼저 일치
        assert_eq!(m.kind, ChartPatternKind::HeadAndShoulders);

        let m = classify(
            &[dec!(100), dec!(110), dec!(95)],
            &[dec!(80), dec!(85), dec!(70)],
        );
        assert_eq!(m.kind, ChartPatternKind::VTop);
        assert_eq!(m.key_level, Some(dec!(110)));
    }

    #[test]
    fn test_wedges_and_triangles() {
        // 고가 +3%, 저가 +6% → 상승 쐐기
        let m = classify(&[dec!(100), dec!(103)], &[dec!(90), dec!(95.4)]);
        assert_eq!(m.kind, ChartPatternKind::RisingWedge);
        assert_eq!(m.trend, PatternTrend::Bearish);

        // 고가 -6%, 저가 -3% → 하락 쐐기
        let m = classify(&[dec!(100), dec!(94)], &[dec!(90), dec!(87.3)]);
        assert_eq!(m.kind, ChartPatternKind::FallingWedge);

        // 고가 -5%, 저가 +5% → 대칭 삼각형
        let m = classify(&[dec!(100), dec!(95)], &[dec!(80), dec!(84)]);
        assert_eq!(m.kind, ChartPatternKind::SymmetricalTriangle);
        assert_eq!(m.trend, PatternTrend::Sideways);
    }

    #[test]
    fn test_channels_and_broadening() {
        // 고가 +5%, 저가 +5.5% → 평행 상승 채널
        let m = classify(&[dec!(100), dec!(105)], &[dec!(90), dec!(94.95)]);
        assert_eq!(m.kind, ChartPatternKind::AscendingChannel);

        let m = classify(&[dec!(100), dec!(95)], &[dec!(90), dec!(85.5)]);
        assert_eq!(m.kind, ChartPatternKind::DescendingChannel);

        let m = classify(&[dec!(100), dec!(106)], &[dec!(90), dec!(85)]);
        assert_eq!(m.kind, ChartPatternKind::BroadeningFormation);
    }

    #[test]
    fn test_bull_flag_after_pole() {
        // l0=80 → h1=100 (+25% 깃대), 이후 고가 -3%, 저가 -3.2% 평행 하락
        let set = interleaved(
            &[dec!(90), dec!(100), dec!(97)],
            &[dec!(80), dec!(95), dec!(91.96)],
        );
        let m = ChartPatternClassifier::default().classify(&set);
        assert_eq!(m.kind, ChartPatternKind::BullFlag);
        assert_eq!(m.key_level, Some(dec!(97)));
    }

    #[test]
    fn test_best_similarity_policy() {
        // 고가 간격 1.5%, 저가 간격 0.2%: 둘 다 일치
        let set = ExtremaSet::from_prices(&[dec!(100), dec!(101.5)], &[dec!(90), dec!(90.18)]);

        let first = ChartPatternClassifier::default().classify(&set);
        assert_eq!(first.kind, ChartPatternKind::DoubleTop);

        let best = ChartPatternClassifier::new(
            ChartPatternConfig::default().with_policy(SelectionPolicy::BestSimilarity),
        )
        .classify(&set);
        assert_eq!(best.kind, ChartPatternKind::DoubleBottom);
        assert!(best.similarity > first.similarity);
    }

    #[test]
    fn test_evaluate_all_in_catalogue_order() {
        let set = ExtremaSet::from_prices(&[dec!(100), dec!(101.5)], &[dec!(90), dec!(90.18)]);
        let all = ChartPatternClassifier::default().evaluate_all(&set);
        let kinds: Vec<_> = all.iter().map(|m| m.kind).collect();
        assert_eq!(kinds[0], ChartPatternKind::DoubleTop);
        assert_eq!(kinds[1], ChartPatternKind::DoubleBottom);
        assert!(kinds.contains(&ChartPatternKind::HorizontalChannel));
    }

    #[test]
    fn test_scorer_only_consulted_without_rule_match() {
        let scorer = Arc::new(FixedScorer::new(Some(
            ScoredPattern::from_label("bull_pennant", 0.75).unwrap(),
        )));
        let clf = ChartPatternClassifier::default().with_scorer(scorer.clone());

        // 규칙 일치 → 스코어러 미호출
        let m = clf.classify(&ExtremaSet::from_prices(
            &[dec!(100), dec!(100.5)],
            &[dec!(90), dec!(92)],
        ));
        assert_eq!(m.kind, ChartPatternKind::DoubleTop);
        assert_eq!(scorer.calls(), 0);

        // 고가 +10%, 저가 +3%: 어느 규칙에도 해당하지 않음
        let m = clf.classify(&ExtremaSet::from_prices(
            &[dec!(100), dec!(110)],
            &[dec!(90), dec!(92.7)],
        ));
        assert_eq!(scorer.calls(), 1);
        assert_eq!(m.kind, ChartPatternKind::BullPennant);
        assert_eq!(m.source, PatternSource::Scorer);
        assert!((m.similarity - 75.0).abs() < 1e-9);
    }
}
