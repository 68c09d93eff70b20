//! 설정 관리.
//!
//! 로드 순서 (뒤가 앞을 덮어씀):
//! 1. 내장 기본값 (`AppConfig::default()`)
//! 2. TOML 파일 (선택, 기본 `config/chartwatch.toml`)
//! 3. `CHARTWATCH__` 접두사 환경 변수 (구분자 `__`, 예: `CHARTWATCH__ANALYSIS__EXTREMA_ORDER=7`)
//!
//! `.env` 파일이 있으면 가장 먼저 환경 변수로 읽어들입니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{SelectionPolicy, TrendMethod};
use crate::error::ChartwatchError;
use crate::types::{Timeframe, WatchSymbol};

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/chartwatch.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub schedule: ScheduleConfig,
    pub provider: ProviderConfig,
    pub watchlist: WatchlistConfig,
    pub logging: LoggingConfig,
    pub notifications: NotificationConfig,
}

/// 분석 파라미터.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 극값 이웃 범위 k
    pub extrema_order: usize,
    /// 레벨/패턴/추세 계산용 타임프레임
    pub primary_timeframe: Timeframe,
    pub primary_bars: usize,
    /// 캔들스틱 패턴용 타임프레임
    pub candle_timeframe: Timeframe,
    pub candle_bars: usize,
    /// 컨플루언스 확인 타임프레임 (평가 순서)
    pub confluence_timeframes: Vec<Timeframe>,
    /// 컨플루언스 인정 최소 유사도 (0 ~ 100)
    pub confluence_min_similarity: f64,
    pub selection_policy: SelectionPolicy,
    pub trend_method: TrendMethod,
    /// 회귀 방식의 이동평균 창 크기
    pub regression_window: usize,
    /// 거래량 상위 캔들로 강한 레벨 확장
    pub volume_widening: bool,
    /// 동시에 분석할 최대 심볼 수
    pub max_concurrency: usize,
    /// 심볼당 분석 타임아웃 (초)
    pub symbol_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extrema_order: 5,
            primary_timeframe: Timeframe::D1,
            primary_bars: 100,
            candle_timeframe: Timeframe::H4,
            candle_bars: 100,
            confluence_timeframes: vec![
                Timeframe::M5,
                Timeframe::M15,
                Timeframe::H1,
                Timeframe::D1,
                Timeframe::W1,
            ],
            confluence_min_similarity: 80.0,
            selection_policy: SelectionPolicy::FirstMatch,
            trend_method: TrendMethod::ExtremaMeanShift,
            regression_window: 5,
            volume_widening: true,
            max_concurrency: 4,
            symbol_timeout_secs: 60,
        }
    }
}

/// 주기 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// 분석 패스 간격 (초)
    pub analysis_interval_secs: u64,
    /// 돌파 감시 간격 (초)
    pub breakout_poll_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            analysis_interval_secs: 3600,
            breakout_poll_secs: 10,
        }
    }
}

/// 시세 데이터 제공자 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// REST API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2,
        }
    }
}

/// 시작 시 감시 목록.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchlistConfig {
    pub symbols: Vec<WatchSymbol>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        let symbols = ["BTCUSDT", "ETHUSDT"]
            .iter()
            .filter_map(|s| WatchSymbol::binance(s).ok())
            .collect();
        Self { symbols }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// pretty, json, compact
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 알림 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub telegram: TelegramSettings,
}

/// 텔레그램 알림 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ChartwatchError> {
        // .env는 있으면 읽고 없으면 무시
        let _ = dotenvy::dotenv();

        let defaults = config::Config::try_from(&AppConfig::default())?;

        let builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("CHARTWATCH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("analysis.confluence_timeframes")
                    .with_list_parse_key("watchlist.symbols")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ChartwatchError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// 값의 범위를 검증합니다.
    pub fn validate(&self) -> Result<(), ChartwatchError> {
        let a = &self.analysis;
        if a.extrema_order == 0 {
            return Err(ChartwatchError::Config(
                "analysis.extrema_order는 1 이상이어야 합니다".into(),
            ));
        }
        if a.primary_bars == 0 || a.candle_bars == 0 {
            return Err(ChartwatchError::Config(
                "analysis.*_bars는 1 이상이어야 합니다".into(),
            ));
        }
        if !(0.0..=100.0).contains(&a.confluence_min_similarity) {
            return Err(ChartwatchError::Config(format!(
                "analysis.confluence_min_similarity 범위 초과: {}",
                a.confluence_min_similarity
            )));
        }
        if a.regression_window == 0 || a.max_concurrency == 0 || a.symbol_timeout_secs == 0 {
            return Err(ChartwatchError::Config(
                "analysis.regression_window, max_concurrency, symbol_timeout_secs는 1 이상이어야 합니다"
                    .into(),
            ));
        }
        if self.schedule.analysis_interval_secs == 0 || self.schedule.breakout_poll_secs == 0 {
            return Err(ChartwatchError::Config("schedule 간격은 1초 이상이어야 합니다".into()));
        }
        if self.provider.max_attempts == 0 || self.provider.timeout_secs == 0 {
            return Err(ChartwatchError::Config(
                "provider.max_attempts, timeout_secs는 1 이상이어야 합니다".into(),
            ));
        }
        Ok(())
    }
}
