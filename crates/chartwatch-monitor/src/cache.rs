//! 분석 결과 캐시.
//!
//! 캐시는 세대(generation) 단위로 통째로 교체됩니다. 읽는 쪽은 `Arc`로
//! 한 세대 전체를 받으므로 서로 다른 패스의 결과가 섞여 보이지 않습니다.

use chartwatch_core::{LevelPair, SymbolReport};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 한 번의 분석 패스가 만든 결과.
#[derive(Debug, Clone, Default)]
pub struct CacheGeneration {
    /// 0은 아직 패스가 실행되지 않은 빈 캐시
    pub generation: u64,
    /// 심볼 → 분석 결과
    pub reports: HashMap<String, SymbolReport>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CacheGeneration {
    /// 분석이 완료된 심볼의 레벨만 모읍니다.
    pub fn levels(&self) -> HashMap<String, LevelPair> {
        self.reports
            .iter()
            .filter_map(|(symbol, report)| {
                report
                    .analysis()
                    .map(|result| (symbol.clone(), result.levels))
            })
            .collect()
    }

    pub fn report(&self, symbol: &str) -> Option<&SymbolReport> {
        self.reports.get(symbol)
    }
}

/// 결과 캐시.
#[derive(Debug, Default)]
pub struct ResultCache {
    current: RwLock<Arc<CacheGeneration>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 세대 다음 번호로 새 세대를 만듭니다. 아직 게시하지 않습니다.
    ///
    /// 게시 전까지 독자는 이전 세대를 봅니다. 세대를 쓰는 쪽은 분석 패스 하나뿐입니다.
    pub async fn prepare(&self, reports: HashMap<String, SymbolReport>) -> Arc<CacheGeneration> {
        let generation = self.current.read().await.generation + 1;
        Arc::new(CacheGeneration {
            generation,
            reports,
            last_updated: Some(Utc::now()),
        })
    }

    /// 준비한 세대를 통째로 게시합니다.
    pub async fn publish(&self, next: Arc<CacheGeneration>) {
        *self.current.write().await = next;
    }

    pub async fn snapshot(&self) -> Arc<CacheGeneration> {
        Arc::clone(&*self.current.read().await)
    }
}
