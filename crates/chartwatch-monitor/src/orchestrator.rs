//! 분석 오케스트레이터.
//!
//! 심볼 하나에 대해 다음 순서로 분석을 수행합니다:
//! 1. 기본 타임프레임 캔들 조회 (데이터 없음/재시도 소진이면 여기서 종료)
//! 2. 극값 → 지지/저항, 차트 패턴, 추세
//! 3. 캔들 타임프레임 조회 → 캔들스틱 패턴
//! 4. 다른 타임프레임과의 컨플루언스
//!
//! 패스는 심볼마다 독립적이며 `max_concurrency`개까지 동시에 실행됩니다.
//! 어떤 심볼이 실패해도 패스는 모든 심볼의 결과를 돌려줍니다.

use chartwatch_analytics::{
    require_len, CandlestickClassifier, ChartPatternClassifier, ChartPatternConfig,
    ConfluenceChecker, ExtremaDetector, LevelCalculator, PatternScorer, TrendEstimator,
    MIN_CANDLE_BARS, MIN_PATTERN_BARS,
};
use chartwatch_core::{
    watch_span, AnalysisConfig, AnalysisResult, CandleSeries, CandlestickKind, FetchOutcome,
    MarketDataProvider, PatternMatch, SymbolReport, Timeframe, WatchSymbol,
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn, Instrument};

use crate::error::Result;
use crate::stats::PassStats;

/// 한 번의 패스 결과.
#[derive(Debug, Clone, Default)]
pub struct PassOutput {
    /// 요청된 모든 심볼의 결과
    pub reports: HashMap<String, SymbolReport>,
    pub stats: PassStats,
}

/// 심볼 분석기.
#[derive(Debug, Clone)]
pub struct Analyzer {
    detector: ExtremaDetector,
    levels: LevelCalculator,
    candles: CandlestickClassifier,
    patterns: Arc<ChartPatternClassifier>,
    trend: TrendEstimator,
    confluence: ConfluenceChecker,
    primary_timeframe: Timeframe,
    primary_bars: usize,
    candle_timeframe: Timeframe,
    candle_bars: usize,
    max_concurrency: usize,
    symbol_timeout: Duration,
}

impl Analyzer {
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// 규칙이 일치하지 않을 때 참조할 스코어러를 붙여 생성합니다.
    pub fn with_scorer(config: &AnalysisConfig, scorer: Arc<dyn PatternScorer>) -> Result<Self> {
        Self::build(config, Some(scorer))
    }

    fn build(config: &AnalysisConfig, scorer: Option<Arc<dyn PatternScorer>>) -> Result<Self> {
        let detector = ExtremaDetector::new(config.extrema_order)?;

        let mut classifier = ChartPatternClassifier::new(
            ChartPatternConfig::default().with_policy(config.selection_policy),
        );
        if let Some(scorer) = scorer {
            classifier = classifier.with_scorer(scorer);
        }
        let patterns = Arc::new(classifier);

        let confluence = ConfluenceChecker::new(
            config.confluence_timeframes.clone(),
            config.primary_bars,
            config.confluence_min_similarity,
            detector,
            Arc::clone(&patterns),
        );

        Ok(Self {
            detector,
            levels: LevelCalculator::new(config.volume_widening),
            candles: CandlestickClassifier::default(),
            patterns,
            trend: TrendEstimator::new(config.trend_method, config.regression_window),
            confluence,
            primary_timeframe: config.primary_timeframe,
            primary_bars: config.primary_bars,
            candle_timeframe: config.candle_timeframe,
            candle_bars: config.candle_bars,
            max_concurrency: config.max_concurrency.max(1),
            symbol_timeout: Duration::from_secs(config.symbol_timeout_secs),
        })
    }

    /// 심볼 하나를 분석합니다. 실패는 `SymbolReport`로 표현되며 패닉하지 않습니다.
    pub async fn analyze_symbol(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &WatchSymbol,
    ) -> SymbolReport {
        self.analyze_inner(provider, symbol)
            .instrument(watch_span!("analyze_symbol", symbol))
            .await
    }

    async fn analyze_inner(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &WatchSymbol,
    ) -> SymbolReport {
        let outcome: FetchOutcome<CandleSeries> = provider
            .fetch_candles(symbol, self.primary_timeframe, self.primary_bars)
            .await
            .into();

        let series = match outcome.settle() {
            FetchOutcome::Ok(series) => series,
            FetchOutcome::NoData(reason) => {
                debug!(%reason, "no primary candles");
                return SymbolReport::NoData { reason };
            }
            FetchOutcome::TransientError(err) | FetchOutcome::Failed(err) => {
                return SymbolReport::Failed {
                    reason: err.to_string(),
                };
            }
        };

        // 레벨은 분석 시점 종가 기준, 표시 가격은 현재가(실패 시 종가)
        let close = series.last_close();
        let current_price = match provider.fetch_current_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                debug!(error = %e, "current price unavailable, using last close");
                close
            }
        };

        let extrema = self.detector.detect(&series);
        let levels = self.levels.calculate(close, &extrema, Some(&series));

        let pattern = match require_len(series.len(), MIN_PATTERN_BARS) {
            Ok(()) => self.patterns.classify(&extrema),
            Err(e) => {
                debug!(error = %e, "chart pattern undetermined");
                PatternMatch::none()
            }
        };
        let trend = self.trend.estimate(&series, &extrema);
        let candlestick = self.candlestick(provider, symbol).await;

        let confluence_timeframe = self.confluence.check(provider, symbol, pattern.trend).await;

        SymbolReport::Analyzed(Box::new(AnalysisResult {
            symbol: symbol.clone(),
            current_price,
            levels,
            candlestick,
            pattern,
            trend,
            confluence: confluence_timeframe.is_some(),
            confluence_timeframe,
            analyzed_at: Utc::now(),
        }))
    }

    async fn candlestick(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &WatchSymbol,
    ) -> CandlestickKind {
        match provider
            .fetch_candles(symbol, self.candle_timeframe, self.candle_bars)
            .await
        {
            Ok(series) if series.len() >= MIN_CANDLE_BARS => self.candles.classify(&series),
            Ok(_) => CandlestickKind::None,
            Err(e) => {
                debug!(timeframe = %self.candle_timeframe, error = %e, "candlestick skipped");
                CandlestickKind::None
            }
        }
    }

    /// 심볼별 타임아웃을 적용하여 분석합니다. 세 번째 값은 타임아웃 여부입니다.
    async fn analyze_with_timeout(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &WatchSymbol,
    ) -> (String, SymbolReport, bool) {
        match tokio::time::timeout(self.symbol_timeout, self.analyze_symbol(provider, symbol)).await
        {
            Ok(report) => (symbol.symbol.clone(), report, false),
            Err(_) => {
                let secs = self.symbol_timeout.as_secs();
                warn!(symbol = %symbol, timeout_secs = secs, "심볼 분석 타임아웃");
                let report = SymbolReport::Failed {
                    reason: format!("분석 타임아웃 ({}초)", secs),
                };
                (symbol.symbol.clone(), report, true)
            }
        }
    }

    /// 감시 목록 전체를 분석합니다.
    ///
    /// 심볼별 타임아웃을 넘기면 해당 심볼은 `Failed`로 기록됩니다.
    pub async fn run_pass(
        &self,
        provider: &dyn MarketDataProvider,
        symbols: &[WatchSymbol],
    ) -> PassOutput {
        let started = Instant::now();

        let tasks: Vec<_> = symbols
            .iter()
            .map(|symbol| self.analyze_with_timeout(provider, symbol))
            .collect();
        let results: Vec<(String, SymbolReport, bool)> = stream::iter(tasks)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut output = PassOutput::default();
        for (symbol, report, timed_out) in results {
            output.stats.record(&report);
            if timed_out {
                output.stats.timed_out += 1;
            }
            if let SymbolReport::Failed { reason } = &report {
                warn!(%symbol, %reason, "심볼 분석 실패");
            }
            output.reports.insert(symbol, report);
        }
        output.stats.elapsed = started.elapsed();
        output
    }
}
