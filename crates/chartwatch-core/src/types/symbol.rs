//! 감시 대상 심볼.
//!
//! 사용자 입력("btc", "ethusdt", "SOLUSDT@BINANCE")을 정규화하여
//! `WatchSymbol`로 변환합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChartwatchError;

/// 기본 호가 자산.
pub const DEFAULT_QUOTE: &str = "USDT";

/// 기본 거래소.
pub const DEFAULT_EXCHANGE: &str = "BINANCE";

/// 감시 목록 항목 (심볼 + 거래소 메타데이터).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WatchSymbol {
    /// 거래소 심볼 (예: BTCUSDT)
    pub symbol: String,
    /// 거래소 이름 (예: BINANCE)
    pub exchange: String,
}

impl WatchSymbol {
    /// 정규화된 심볼을 생성합니다.
    ///
    /// 대문자로 변환하고, 호가 자산(`USDT`)이 없으면 덧붙입니다.
    pub fn new(symbol: &str, exchange: &str) -> Result<Self, ChartwatchError> {
        let mut symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ChartwatchError::InvalidInput(format!(
                "심볼은 영숫자만 허용됩니다: '{}'",
                symbol
            )));
        }
        if !symbol.ends_with(DEFAULT_QUOTE) {
            symbol.push_str(DEFAULT_QUOTE);
        }

        let exchange = exchange.trim().to_uppercase();
        let exchange = if exchange.is_empty() {
            DEFAULT_EXCHANGE.to_string()
        } else {
            exchange
        };

        Ok(Self { symbol, exchange })
    }

    /// 기본 거래소(BINANCE) 심볼을 생성합니다.
    pub fn binance(symbol: &str) -> Result<Self, ChartwatchError> {
        Self::new(symbol, DEFAULT_EXCHANGE)
    }

    /// 호가 자산을 제외한 기준 자산 (예: BTCUSDT → BTC).
    pub fn base_asset(&self) -> &str {
        self.symbol
            .strip_suffix(DEFAULT_QUOTE)
            .filter(|base| !base.is_empty())
            .unwrap_or(&self.symbol)
    }
}

impl fmt::Display for WatchSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.exchange)
    }
}

impl FromStr for WatchSymbol {
    type Err = ChartwatchError;

    /// `SYMBOL` 또는 `SYMBOL@EXCHANGE` 형식을 파싱합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((symbol, exchange)) => Self::new(symbol, exchange),
            None => Self::binance(s),
        }
    }
}

impl TryFrom<String> for WatchSymbol {
    type Error = ChartwatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WatchSymbol> for String {
    fn from(symbol: WatchSymbol) -> Self {
        symbol.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_user_input() {
        let s = WatchSymbol::binance(" btc ").unwrap();
        assert_eq!(s.symbol, "BTCUSDT");
        assert_eq!(s.exchange, "BINANCE");
        assert_eq!(s.base_asset(), "BTC");

        let s = WatchSymbol::binance("ethusdt").unwrap();
        assert_eq!(s.symbol, "ETHUSDT");
    }

    #[test]
    fn test_parse_with_exchange() {
        let s: WatchSymbol = "solusdt@binance".parse().unwrap();
        assert_eq!(s.symbol, "SOLUSDT");
        assert_eq!(s.exchange, "BINANCE");
        assert_eq!(s.to_string(), "SOLUSDT@BINANCE");
    }

    #[test]
    fn test_rejects_invalid_symbol() {
        assert!(WatchSymbol::binance("").is_err());
        assert!(WatchSymbol::binance("BTC/USDT").is_err());
    }

    #[test]
    fn test_serde_string_form() {
        let s = WatchSymbol::binance("BTC").unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"BTCUSDT@BINANCE\"");
        let back: WatchSymbol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
