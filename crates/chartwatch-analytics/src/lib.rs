//! 차트 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 국소 극값 탐지 ([`ExtremaDetector`])
//! - 지지/저항 레벨 계산 ([`LevelCalculator`])
//! - 캔들스틱 패턴 분류 ([`CandlestickClassifier`])
//! - 차트 패턴 분류 ([`ChartPatternClassifier`])와 선택적 스코어러 ([`ml`])
//! - 추세 추정 ([`TrendEstimator`])
//! - 다중 타임프레임 컨플루언스 ([`ConfluenceChecker`])
//!
//! 모든 분석기는 상태가 없고 같은 입력에 같은 결과를 반환합니다.
//! 데이터가 부족하면 에러 대신 "판단 불가" 값(`None`, `Sideways` 등)을 돌려줍니다.

pub mod candlestick;
pub mod chart_pattern;
pub mod confluence;
pub mod error;
pub mod extrema;
pub mod levels;
pub mod ml;
pub mod trend;

pub use candlestick::{CandleParams, CandlestickClassifier, MIN_CANDLE_BARS};
pub use chart_pattern::{ChartPatternClassifier, ChartPatternConfig, MIN_PATTERN_BARS};
pub use confluence::ConfluenceChecker;
pub use error::{require_len, AnalysisError, AnalyticsResult};
pub use extrema::{ExtremaDetector, DEFAULT_ORDER};
pub use levels::{LevelCalculator, VOLUME_WIDENING_BARS};
pub use ml::{FixedScorer, MlError, PatternFeatures, PatternScorer, ScoredPattern};
pub use trend::TrendEstimator;
