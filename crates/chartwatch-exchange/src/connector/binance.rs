//! Binance 시세 커넥터.
//!
//! Binance Spot 공개 REST API(인증 불필요)로 캔들과 현재가를 조회합니다.
//! - `GET /api/v3/klines`
//! - `GET /api/v3/ticker/price`

use async_trait::async_trait;
use chartwatch_core::{
    CandleSeries, FetchError, Kline, MarketDataProvider, ProviderConfig, Timeframe, WatchSymbol,
};
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{ExchangeError, ExchangeResult};

/// 캔들 조회 한 번에 받을 수 있는 최대 개수.
pub const MAX_KLINE_LIMIT: usize = 1000;

/// 존재하지 않는 심볼 에러 코드.
const INVALID_SYMBOL_CODE: i32 = -1121;

// ============================================================================
// 설정
// ============================================================================

/// Binance 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// REST API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl BinanceConfig {
    pub fn from_settings(settings: &ProviderConfig) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
        }
    }

    /// 기본 URL 변경 (테스트 서버 등).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
struct BinanceError {
    code: i32,
    msg: String,
}

/// kline 배열 원소. 앞 6개 필드만 사용합니다.
#[derive(Debug, Deserialize)]
struct BinanceKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    #[serde(default)] serde_json::Value, // 6: Close time
    #[serde(default)] serde_json::Value, // 7: Quote asset volume
    #[serde(default)] serde_json::Value, // 8: Number of trades
    #[serde(default)] serde_json::Value, // 9: Taker buy base asset volume
    #[serde(default)] serde_json::Value, // 10: Taker buy quote asset volume
    #[serde(default)] serde_json::Value, // 11: Ignore
);

#[derive(Debug, Deserialize)]
struct BinanceTickerPrice {
    #[allow(dead_code)]
    symbol: String,
    price: String,
}

// ============================================================================
// Binance 클라이언트
// ============================================================================

/// Binance 시세 클라이언트.
#[derive(Debug, Clone)]
pub struct BinanceMarketData {
    config: BinanceConfig,
    client: Client,
}

impl BinanceMarketData {
    /// 새 Binance 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: BinanceConfig) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e))
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &BinanceConfig {
        &self.config
    }

    /// 파라미터에서 쿼리 문자열 생성.
    fn build_query(params: &[(&str, String)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// 공개 API 요청 (인증 불필요).
    async fn public_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let query = Self::build_query(params);

        let full_url = if query.is_empty() {
            url
        } else {
            format!("{}?{}", url, query)
        };

        debug!("GET {}", full_url);

        let response = self.client.get(&full_url).send().await?;

        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();

        // 429: 한도 초과, 418: 한도 초과 반복으로 IP 차단
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return Err(ExchangeError::RateLimited { retry_after_ms });
        }

        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                ExchangeError::ParseError(e.to_string())
            })
        } else {
            // 에러 응답 파싱 시도
            if let Ok(error) = serde_json::from_str::<BinanceError>(&body) {
                Err(Self::map_error_code(error.code, &error.msg))
            } else {
                Err(ExchangeError::ApiError {
                    code: status.as_u16() as i32,
                    message: body,
                })
            }
        }
    }

    /// Binance 에러 코드를 ExchangeError로 매핑.
    fn map_error_code(code: i32, msg: &str) -> ExchangeError {
        match code {
            -1003 => ExchangeError::RateLimited {
                retry_after_ms: None,
            },
            INVALID_SYMBOL_CODE => ExchangeError::SymbolNotFound(msg.to_string()),
            _ => ExchangeError::ApiError {
                code,
                message: msg.to_string(),
            },
        }
    }

    fn parse_decimal(field: &str, value: &str) -> ExchangeResult<Decimal> {
        value
            .parse()
            .map_err(|_| ExchangeError::ParseError(format!("{}: '{}'", field, value)))
    }

    /// 최근 캔들 조회 (시간 오름차순).
    pub async fn get_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> ExchangeResult<Vec<Kline>> {
        let limit = limit.clamp(1, MAX_KLINE_LIMIT);

        let resp: Vec<BinanceKline> = self
            .public_get(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", timeframe.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        resp.into_iter()
            .map(|k| {
                let open_time = DateTime::from_timestamp_millis(k.0).ok_or_else(|| {
                    ExchangeError::ParseError(format!("open time out of range: {}", k.0))
                })?;
                Ok(Kline::new(
                    symbol,
                    timeframe,
                    open_time,
                    Self::parse_decimal("open", &k.1)?,
                    Self::parse_decimal("high", &k.2)?,
                    Self::parse_decimal("low", &k.3)?,
                    Self::parse_decimal("close", &k.4)?,
                    Self::parse_decimal("volume", &k.5)?,
                ))
            })
            .collect()
    }

    /// 현재가 조회.
    pub async fn get_price(&self, symbol: &str) -> ExchangeResult<Decimal> {
        let resp: BinanceTickerPrice = self
            .public_get("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await?;
        Self::parse_decimal("price", &resp.price)
    }
}

#[async_trait]
impl MarketDataProvider for BinanceMarketData {
    async fn fetch_candles(
        &self,
        symbol: &WatchSymbol,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries, FetchError> {
        let bars = self.get_klines(&symbol.symbol, timeframe, count).await?;
        if bars.is_empty() {
            return Err(FetchError::NoData(format!(
                "{} {}: 빈 캔들 응답",
                symbol, timeframe
            )));
        }
        CandleSeries::new(symbol.symbol.clone(), timeframe, bars)
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn fetch_current_price(&self, symbol: &WatchSymbol) -> Result<Decimal, FetchError> {
        Ok(self.get_price(&symbol.symbol).await?)
    }

    fn provider_name(&self) -> &str {
        "binance"
    }
}
