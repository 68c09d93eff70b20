//! # Chartwatch Core
//!
//! 차트 감시 시스템의 핵심 도메인 모델과 공통 인프라를 제공합니다:
//! - 캔들 시계열, 극값, 지지/저항 레벨
//! - 패턴 분류 결과와 돌파 상태 머신
//! - 시세 데이터 제공자 trait (`MarketDataProvider`)
//! - 설정 로드 및 로깅 초기화

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
