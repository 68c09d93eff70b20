//! 캔들(OHLCV) 데이터와 캔들 시계열.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ChartwatchError;
use crate::types::Timeframe;

/// 가격 타입.
pub type Price = Decimal;

/// 캔들스틱 한 개.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    /// 거래 심볼 (예: BTCUSDT)
    pub symbol: String,
    pub timeframe: Timeframe,
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    /// 거래량 (기준 자산 단위)
    pub volume: Decimal,
}

impl Kline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 몸통 크기 `|close - open|`.
    pub fn body_size(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 전체 범위 `high - low`.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 윗꼬리 길이.
    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    /// 아랫꼬리 길이.
    pub fn lower_shadow(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }

    /// 몸통 중앙값.
    pub fn body_midpoint(&self) -> Decimal {
        (self.open + self.close) / Decimal::TWO
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// 한 (심볼, 타임프레임)에 대한 불변 캔들 시계열.
///
/// 생성 시 다음을 검증합니다:
/// - 최소 1개 이상의 캔들
/// - 시작 시간이 엄격하게 증가
/// - 모든 가격이 양수이며 `low <= open, close <= high`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Kline>,
}

impl CandleSeries {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Kline>,
    ) -> Result<Self, ChartwatchError> {
        let symbol = symbol.into();

        if bars.is_empty() {
            return Err(ChartwatchError::InvalidSeries(format!(
                "{} {}: 캔들이 비어 있습니다",
                symbol, timeframe
            )));
        }

        for (i, bar) in bars.iter().enumerate() {
            if bar.low <= Decimal::ZERO {
                return Err(ChartwatchError::InvalidSeries(format!(
                    "{} {}: {}번째 캔들의 가격이 양수가 아닙니다",
                    symbol, timeframe, i
                )));
            }
            if bar.high < bar.open.max(bar.close) || bar.low > bar.open.min(bar.close) {
                return Err(ChartwatchError::InvalidSeries(format!(
                    "{} {}: {}번째 캔들의 고가/저가가 시가/종가를 포함하지 않습니다",
                    symbol, timeframe, i
                )));
            }
        }

        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].open_time <= w[0].open_time)
        {
            return Err(ChartwatchError::InvalidSeries(format!(
                "{} {}: {}번째 캔들의 시간이 증가하지 않습니다",
                symbol,
                timeframe,
                i + 1
            )));
        }

        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Kline] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// 항상 false (최소 1개 보장). clippy 규약상 제공합니다.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 가장 최근 캔들.
    pub fn last(&self) -> &Kline {
        // new()가 비어 있지 않음을 보장
        &self.bars[self.bars.len() - 1]
    }

    pub fn last_close(&self) -> Price {
        self.last().close
    }

    /// 최근 `n`개 캔들 (부족하면 전체).
    pub fn tail(&self, n: usize) -> &[Kline] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    pub fn highs(&self) -> Vec<Price> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<Price> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<Price> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
