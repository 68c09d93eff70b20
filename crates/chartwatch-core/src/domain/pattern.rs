//! 패턴 분류 결과 타입.
//!
//! - `CandlestickKind`: 최근 1~3개 캔들의 형태
//! - `ChartPatternKind`: 극값 시퀀스로 판단하는 다중 캔들 기하 패턴
//! - `PatternMatch`: 차트 패턴 분류 결과 (유사도, 추세, 핵심 레벨)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==================== 추세 ====================

/// 패턴이 암시하는 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTrend {
    Bullish,
    Bearish,
    Sideways,
    /// 패턴 없음 또는 판단 불가
    Unknown,
}

impl fmt::Display for PatternTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternTrend::Bullish => "Bullish",
            PatternTrend::Bearish => "Bearish",
            PatternTrend::Sideways => "Sideways",
            PatternTrend::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// 추세 추정기의 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Uptrend,
    Downtrend,
    /// 횡보 또는 극값 부족으로 판단 불가
    Sideways,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendDirection::Uptrend => "Uptrend",
            TrendDirection::Downtrend => "Downtrend",
            TrendDirection::Sideways => "Sideways",
        };
        f.write_str(s)
    }
}

// ==================== 캔들스틱 ====================

/// 캔들스틱 패턴.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlestickKind {
    /// 몸통이 범위의 10% 미만
    Doji,
    /// 긴 아랫꼬리 양봉
    Hammer,
    /// 긴 아랫꼬리 음봉
    HangingMan,
    /// 긴 윗꼬리 양봉
    InvertedHammer,
    /// 긴 윗꼬리 음봉
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
    BullishHarami,
    BearishHarami,
    MorningStar,
    EveningStar,
    /// 일치하는 규칙 없음
    None,
}

impl CandlestickKind {
    pub fn label(&self) -> &'static str {
        match self {
            CandlestickKind::Doji => "Doji",
            CandlestickKind::Hammer => "Hammer",
            CandlestickKind::HangingMan => "Hanging Man",
            CandlestickKind::InvertedHammer => "Inverted Hammer",
            CandlestickKind::ShootingStar => "Shooting Star",
            CandlestickKind::BullishEngulfing => "Bullish Engulfing",
            CandlestickKind::BearishEngulfing => "Bearish Engulfing",
            CandlestickKind::BullishHarami => "Bullish Harami",
            CandlestickKind::BearishHarami => "Bearish Harami",
            CandlestickKind::MorningStar => "Morning Star",
            CandlestickKind::EveningStar => "Evening Star",
            CandlestickKind::None => "None",
        }
    }
}

impl fmt::Display for CandlestickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==================== 차트 패턴 ====================

/// 차트 패턴.
///
/// 선언 순서가 곧 카탈로그 평가 순서입니다 (`None` 제외).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPatternKind {
    DoubleTop,
    DoubleBottom,
    TripleTop,
    TripleBottom,
    HeadAndShoulders,
    InverseHeadAndShoulders,
    VTop,
    VBottom,
    RoundingTop,
    RoundingBottom,
    BullFlag,
    BearFlag,
    BullPennant,
    BearPennant,
    RisingWedge,
    FallingWedge,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
    AscendingChannel,
    DescendingChannel,
    HorizontalChannel,
    BroadeningFormation,
    /// 일치하는 패턴 없음
    None,
}

impl ChartPatternKind {
    /// 평가 순서대로 나열한 카탈로그.
    pub const CATALOGUE: [ChartPatternKind; 23] = [
        ChartPatternKind::DoubleTop,
        ChartPatternKind::DoubleBottom,
        ChartPatternKind::TripleTop,
        ChartPatternKind::TripleBottom,
        ChartPatternKind::HeadAndShoulders,
        ChartPatternKind::InverseHeadAndShoulders,
        ChartPatternKind::VTop,
        ChartPatternKind::VBottom,
        ChartPatternKind::RoundingTop,
        ChartPatternKind::RoundingBottom,
        ChartPatternKind::BullFlag,
        ChartPatternKind::BearFlag,
        ChartPatternKind::BullPennant,
        ChartPatternKind::BearPennant,
        ChartPatternKind::RisingWedge,
        ChartPatternKind::FallingWedge,
        ChartPatternKind::AscendingTriangle,
        ChartPatternKind::DescendingTriangle,
        ChartPatternKind::SymmetricalTriangle,
        ChartPatternKind::AscendingChannel,
        ChartPatternKind::DescendingChannel,
        ChartPatternKind::HorizontalChannel,
        ChartPatternKind::BroadeningFormation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartPatternKind::DoubleTop => "Double Top",
            ChartPatternKind::DoubleBottom => "Double Bottom",
            ChartPatternKind::TripleTop => "Triple Top",
            ChartPatternKind::TripleBottom => "Triple Bottom",
            ChartPatternKind::HeadAndShoulders => "Head and Shoulders",
            ChartPatternKind::InverseHeadAndShoulders => "Inverse Head and Shoulders",
            ChartPatternKind::VTop => "V-Top",
            ChartPatternKind::VBottom => "V-Bottom",
            ChartPatternKind::RoundingTop => "Rounding Top",
            ChartPatternKind::RoundingBottom => "Rounding Bottom",
            ChartPatternKind::BullFlag => "Bull Flag",
            ChartPatternKind::BearFlag => "Bear Flag",
            ChartPatternKind::BullPennant => "Bull Pennant",
            ChartPatternKind::BearPennant => "Bear Pennant",
            ChartPatternKind::RisingWedge => "Rising Wedge",
            ChartPatternKind::FallingWedge => "Falling Wedge",
            ChartPatternKind::AscendingTriangle => "Ascending Triangle",
            ChartPatternKind::DescendingTriangle => "Descending Triangle",
            ChartPatternKind::SymmetricalTriangle => "Symmetrical Triangle",
            ChartPatternKind::AscendingChannel => "Ascending Channel",
            ChartPatternKind::DescendingChannel => "Descending Channel",
            ChartPatternKind::HorizontalChannel => "Horizontal Channel",
            ChartPatternKind::BroadeningFormation => "Broadening Formation",
            ChartPatternKind::None => "N/A",
        }
    }

    /// 패턴이 암시하는 방향.
    pub fn implied_trend(&self) -> PatternTrend {
        use ChartPatternKind::*;
        match self {
            DoubleTop | TripleTop | HeadAndShoulders | VTop | RoundingTop | BearFlag
            | BearPennant | RisingWedge | DescendingTriangle | DescendingChannel => {
                PatternTrend::Bearish
            }
            DoubleBottom | TripleBottom | InverseHeadAndShoulders | VBottom | RoundingBottom
            | BullFlag | BullPennant | FallingWedge | AscendingTriangle | AscendingChannel => {
                PatternTrend::Bullish
            }
            SymmetricalTriangle | HorizontalChannel | BroadeningFormation => {
                PatternTrend::Sideways
            }
            None => PatternTrend::Unknown,
        }
    }

    /// 카탈로그 내 위치 (`None`은 카탈로그 밖).
    pub fn catalogue_index(&self) -> Option<usize> {
        Self::CATALOGUE.iter().position(|k| k == self)
    }
}

impl fmt::Display for ChartPatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartPatternKind {
    type Err = String;

    /// 표시 이름 또는 snake_case 이름을 받습니다 (외부 스코어러 레이블 해석용).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::CATALOGUE
            .iter()
            .copied()
            .find(|k| {
                let label: String = k
                    .label()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                label == norm
            })
            .ok_or_else(|| format!("Unknown chart pattern: {}", s))
    }
}

/// 패턴 판정 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSource {
    /// 결정적 규칙 카탈로그
    Rule,
    /// 외부 스코어러 (ML 모델 등)
    Scorer,
}

/// 차트 패턴 분류 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub kind: ChartPatternKind,
    /// 0 ~ 100
    pub similarity: f64,
    pub trend: PatternTrend,
    /// 넥라인 또는 돌파 기준 레벨
    pub key_level: Option<Decimal>,
    pub pattern_low: Option<Decimal>,
    pub pattern_high: Option<Decimal>,
    pub source: PatternSource,
}

impl PatternMatch {
    /// 패턴 없음 (유사도 0).
    pub fn none() -> Self {
        Self {
            kind: ChartPatternKind::None,
            similarity: 0.0,
            trend: PatternTrend::Unknown,
            key_level: None,
            pattern_low: None,
            pattern_high: None,
            source: PatternSource::Rule,
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == ChartPatternKind::None
    }
}

// ==================== 정책 ====================

/// 여러 패턴이 동시에 일치할 때의 선택 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// 카탈로그 순서상 첫 일치 (과거 동작과 동일)
    #[default]
    FirstMatch,
    /// 최고 유사도, 동률이면 카탈로그 순서
    BestSimilarity,
}

/// 추세 추정 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMethod {
    /// 최근 4개 극값의 앞/뒤 2개 평균 비교
    #[default]
    ExtremaMeanShift,
    /// 이동평균으로 평활한 고가/저가의 회귀 기울기
    SmoothedRegression,
}
