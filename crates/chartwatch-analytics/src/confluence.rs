//! 다중 타임프레임 컨플루언스.
//!
//! 기준 패턴의 추세 방향이 다른 타임프레임에서도 충분한 유사도로 나타나는지
//! 순서대로 확인하고, 처음 일치한 타임프레임에서 중단합니다.

use chartwatch_core::{MarketDataProvider, PatternTrend, Timeframe, WatchSymbol};
use std::sync::Arc;
use tracing::debug;

use crate::chart_pattern::{ChartPatternClassifier, MIN_PATTERN_BARS};
use crate::extrema::ExtremaDetector;

/// 컨플루언스 확인기.
#[derive(Debug, Clone)]
pub struct ConfluenceChecker {
    timeframes: Vec<Timeframe>,
    bars: usize,
    min_similarity: f64,
    detector: ExtremaDetector,
    classifier: Arc<ChartPatternClassifier>,
}

impl ConfluenceChecker {
    pub fn new(
        timeframes: Vec<Timeframe>,
        bars: usize,
        min_similarity: f64,
        detector: ExtremaDetector,
        classifier: Arc<ChartPatternClassifier>,
    ) -> Self {
        Self {
            timeframes,
            bars,
            min_similarity,
            detector,
            classifier,
        }
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    /// 기준 추세와 같은 방향의 패턴이 있는 첫 타임프레임을 찾습니다.
    ///
    /// 기준 추세가 `Unknown`이면 조회 없이 `None`입니다.
    /// 조회에 실패했거나 봉이 `MIN_PATTERN_BARS`보다 적은 타임프레임은 건너뜁니다.
    pub async fn check(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &WatchSymbol,
        reference: PatternTrend,
    ) -> Option<Timeframe> {
        if reference == PatternTrend::Unknown {
            return None;
        }

        for &timeframe in &self.timeframes {
            let series = match provider.fetch_candles(symbol, timeframe, self.bars).await {
                Ok(series) => series,
                Err(e) => {
                    debug!(%symbol, %timeframe, error = %e, "confluence timeframe skipped");
                    continue;
                }
            };
            if series.len() < MIN_PATTERN_BARS {
                debug!(
                    %symbol,
                    %timeframe,
                    bars = series.len(),
                    required = MIN_PATTERN_BARS,
                    "confluence timeframe skipped: short history"
                );
                continue;
            }

            let extrema = self.detector.detect(&series);
            let pattern = self.classifier.classify(&extrema);
            if pattern.similarity >= self.min_similarity && pattern.trend == reference {
                debug!(
                    %symbol,
                    %timeframe,
                    pattern = %pattern.kind,
                    similarity = pattern.similarity,
                    "confluence found"
                );
                return Some(timeframe);
            }
        }
        None
    }
}
