//! 감시 목록 모니터.
//!
//! 이 crate는 분석 엔진을 주기적으로 실행하는 데몬을 제공합니다:
//! - 감시 목록 저장소 ([`Watchlist`])
//! - 세대 교체형 결과 캐시 ([`ResultCache`])
//! - 심볼별 잠금을 가진 돌파 상태 테이블 ([`BreakoutTable`])
//! - 분석 오케스트레이터 ([`Analyzer`])와 모니터 ([`Monitor`])
//! - 분석/돌파 감시 스케줄러 ([`Scheduler`])

pub mod breakout;
pub mod cache;
pub mod error;
pub mod monitor;
pub mod orchestrator;
pub mod scheduler;
pub mod stats;
pub mod watchlist;

pub use breakout::{BreakoutTable, PollReport};
pub use cache::{CacheGeneration, ResultCache};
pub use error::{MonitorError, Result};
pub use monitor::Monitor;
pub use orchestrator::{Analyzer, PassOutput};
pub use scheduler::Scheduler;
pub use stats::PassStats;
pub use watchlist::{AddOutcome, Watchlist};
