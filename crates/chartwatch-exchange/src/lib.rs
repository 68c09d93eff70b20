//! 거래소 시세 데이터 제공자.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Binance 공개 REST 커넥터 (`BinanceMarketData`)
//! - 지수 백오프 재시도 래퍼 (`RetryingProvider`)
//! - 메모리 기반 제공자 (`StaticProvider`, 테스트 및 드라이런용)
//!
//! 모든 제공자는 `chartwatch_core::MarketDataProvider`를 구현합니다.

pub mod connector;
pub mod error;
pub mod retry;
pub mod simulated;

pub use connector::{BinanceConfig, BinanceMarketData, MAX_KLINE_LIMIT};
pub use error::*;
pub use retry::{RetryPolicy, RetryingProvider};
pub use simulated::{generate_sample_klines, StaticProvider};
