//! 분석 패스 통계 구조체.

use chartwatch_core::SymbolReport;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 분석 패스 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassStats {
    /// 분석 대상 심볼 수
    pub total: usize,
    /// 분석 완료
    pub analyzed: usize,
    /// 데이터 없음 (재시도 소진 포함)
    pub no_data: usize,
    /// 실패 (타임아웃 포함)
    pub failed: usize,
    /// 심볼 타임아웃
    pub timed_out: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PassStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 심볼 결과 하나를 집계합니다.
    pub fn record(&mut self, report: &SymbolReport) {
        self.total += 1;
        match report {
            SymbolReport::Analyzed(_) => self.analyzed += 1,
            SymbolReport::NoData { .. } => self.no_data += 1,
            SymbolReport::Failed { .. } => self.failed += 1,
        }
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.analyzed as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            ok = self.analyzed,
            no_data = self.no_data,
            failed = self.failed,
            timed_out = self.timed_out,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "분석 패스 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_rate() {
        let mut stats = PassStats::new();
        assert_eq!(stats.success_rate(), 0.0);

        stats.record(&SymbolReport::NoData {
            reason: "empty".into(),
        });
        stats.record(&SymbolReport::Failed {
            reason: "timeout".into(),
        });

        assert_eq!(stats.total, 2);
        assert_eq!(stats.no_data, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate(), 0.0);
    }
}
