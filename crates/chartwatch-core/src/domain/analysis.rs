//! 심볼별 분석 결과.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::{CandlestickKind, DisplayLevel, LevelPair, PatternMatch, TrendDirection};
use crate::types::{Timeframe, WatchSymbol};

/// 한 심볼에 대한 한 번의 분석 결과.
///
/// 분석 패스마다 통째로 교체되며 병합되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: WatchSymbol,
    /// 분석 시점 현재가. 조회에 실패하면 주 타임프레임 마지막 종가
    pub current_price: Decimal,
    pub levels: LevelPair,
    /// 보조 타임프레임의 캔들스틱 패턴
    pub candlestick: CandlestickKind,
    pub pattern: PatternMatch,
    pub trend: TrendDirection,
    pub confluence: bool,
    /// 컨플루언스를 확인한 타임프레임
    pub confluence_timeframe: Option<Timeframe>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// 사람이 읽을 수 있는 요약. 정의되지 않은 값은 "N/A"로 표시합니다.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[{}] {}", self.symbol, self.analyzed_at.format("%Y-%m-%d %H:%M UTC"));
        let _ = writeln!(out, "  Price: {}", self.current_price.normalize());
        let _ = writeln!(
            out,
            "  Support: {} (strong {})",
            DisplayLevel(self.levels.nearest_support),
            DisplayLevel(self.levels.strong_support)
        );
        let _ = writeln!(
            out,
            "  Resistance: {} (strong {})",
            DisplayLevel(self.levels.nearest_resistance),
            DisplayLevel(self.levels.strong_resistance)
        );
        let candle = match self.candlestick {
            CandlestickKind::None => "N/A",
            other => other.label(),
        };
        let _ = writeln!(out, "  Candlestick: {}", candle);
        if self.pattern.is_none() {
            let _ = writeln!(out, "  Pattern: N/A");
        } else {
            let _ = writeln!(
                out,
                "  Pattern: {} ({:.1}%, {}, key {})",
                self.pattern.kind,
                self.pattern.similarity,
                self.pattern.trend,
                DisplayLevel(self.pattern.key_level)
            );
        }
        let _ = writeln!(out, "  Trend: {}", self.trend);
        let confluence = match (self.confluence, self.confluence_timeframe) {
            (true, Some(tf)) => format!("Yes ({})", tf),
            (true, None) => "Yes".to_string(),
            (false, _) => "No".to_string(),
        };
        let _ = write!(out, "  Confluence: {}", confluence);
        out
    }
}

/// 분석 패스에서 한 심볼의 결과.
///
/// 어떤 심볼의 실패도 패스 전체를 중단시키지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolReport {
    Analyzed(Box<AnalysisResult>),
    /// 데이터 없음 (재시도 소진 포함)
    NoData { reason: String },
    /// 분석 실패 (파싱 에러, 타임아웃 등)
    Failed { reason: String },
}

impl SymbolReport {
    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            SymbolReport::Analyzed(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_analyzed(&self) -> bool {
        matches!(self, SymbolReport::Analyzed(_))
    }

    /// 한 줄 요약.
    pub fn summary(&self) -> String {
        match self {
            SymbolReport::Analyzed(result) => result.summary(),
            SymbolReport::NoData { reason } => format!("No data: {}", reason),
            SymbolReport::Failed { reason } => format!("Error: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChartPatternKind, PatternSource, PatternTrend};
    use rust_decimal_macros::dec;

    fn result(pattern: PatternMatch) -> AnalysisResult {
        AnalysisResult {
            symbol: WatchSymbol::binance("BTC").unwrap(),
            current_price: dec!(100.50),
            levels: LevelPair {
                nearest_support: Some(dec!(95)),
                ..Default::default()
            },
            candlestick: CandlestickKind::None,
            pattern,
            trend: TrendDirection::Sideways,
            confluence: false,
            confluence_timeframe: None,
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_marks_undefined_values() {
        let summary = result(PatternMatch::none()).summary();
        assert!(summary.contains("Price: 100.5"));
        assert!(summary.contains("Support: 95 (strong N/A)"));
        assert!(summary.contains("Resistance: N/A"));
        assert!(summary.contains("Candlestick: N/A"));
        assert!(summary.contains("Pattern: N/A"));
        assert!(summary.contains("Confluence: No"));
    }

    #[test]
    fn test_summary_with_pattern() {
        let pattern = PatternMatch {
            kind: ChartPatternKind::DoubleTop,
            similarity: 99.5,
            trend: PatternTrend::Bearish,
            key_level: Some(dec!(90)),
            pattern_low: Some(dec!(90)),
            pattern_high: Some(dec!(100.5)),
            source: PatternSource::Rule,
        };
        let summary = result(pattern).summary();
        assert!(summary.contains("Pattern: Double Top (99.5%, Bearish, key 90)"));
    }

    #[test]
    fn test_report_accessors() {
        let report = SymbolReport::NoData {
            reason: "empty".into(),
        };
        assert!(!report.is_analyzed());
        assert!(report.analysis().is_none());
        assert_eq!(report.summary(), "No data: empty");
    }
}
