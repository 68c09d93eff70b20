//! 주기 실행 스케줄러.
//!
//! 두 개의 독립 태스크로 동작합니다:
//! - 분석 패스 (기본 1시간, 시작 직후 1회 실행)
//! - 돌파 감시 (기본 10초)
//!
//! 각 태스크는 자신의 틱을 순서대로 처리하므로 같은 종류끼리 겹치지 않으며,
//! 늦어진 틱은 건너뜁니다. 종료 토큰이 취소되면 진행 중인 작업을 마친 뒤 멈춥니다.

use chartwatch_core::ScheduleConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::monitor::Monitor;

/// 분석/감시 스케줄러.
pub struct Scheduler {
    monitor: Arc<Monitor>,
    analysis_interval: Duration,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(monitor: Arc<Monitor>, schedule: &ScheduleConfig) -> Self {
        Self {
            monitor,
            analysis_interval: Duration::from_secs(schedule.analysis_interval_secs.max(1)),
            poll_interval: Duration::from_secs(schedule.breakout_poll_secs.max(1)),
        }
    }

    /// 종료 토큰이 취소될 때까지 두 주기를 실행합니다.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            analysis_interval_secs = self.analysis_interval.as_secs(),
            poll_interval_secs = self.poll_interval.as_secs(),
            "스케줄러 시작"
        );

        tokio::join!(
            analysis_loop(
                Arc::clone(&self.monitor),
                self.analysis_interval,
                shutdown.clone()
            ),
            poll_loop(Arc::clone(&self.monitor), self.poll_interval, shutdown),
        );

        info!("스케줄러 종료");
    }

    /// 백그라운드 태스크로 실행합니다.
    pub fn start(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

async fn analysis_loop(monitor: Arc<Monitor>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(stats) = monitor.trigger_analysis().await {
                    debug!(analyzed = stats.analyzed, "scheduled analysis pass finished");
                }
            }
        }
    }
}

async fn poll_loop(monitor: Arc<Monitor>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(report) = monitor.poll_breakouts().await {
                    debug!(
                        checked = report.checked,
                        alerts = report.alerts.len(),
                        failed = report.failed,
                        "breakout poll finished"
                    );
                }
            }
        }
    }
}
