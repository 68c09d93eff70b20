//! 알림 이벤트, 전송기 trait, 에러 타입.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 알림 우선순위. 돌파는 `High`, 오류 없는 분석 요약은 `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// 모니터가 발생시키는 이벤트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// 지지선 이탈 / 저항선 돌파
    Breakout {
        symbol: String,
        /// `support_broken` 또는 `resistance_broken`
        kind: String,
        level: Decimal,
        price: Decimal,
        message: String,
    },
    /// 분석 패스 완료 요약
    AnalysisCompleted {
        analyzed: usize,
        no_data: usize,
        failed: usize,
        elapsed_ms: u64,
    },
    /// 시스템 오류
    SystemError { error_code: String, message: String },
    /// 사용자 정의 알림
    Custom { title: String, message: String },
}

/// 전송 단위. 생성 시각과 UUID가 붙습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub event: NotificationEvent,
    pub priority: NotificationPriority,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(event: NotificationEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            priority: NotificationPriority::Normal,
            timestamp: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }
}

pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 전송 에러. 모니터는 이 에러를 로그로만 남기고 감시를 계속합니다.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// 비정상 HTTP 응답
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    /// 429 응답. 값은 `retry_after` 초
    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// 알림 채널.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;

    /// 자격 증명이 갖춰지고 켜져 있는지.
    fn is_enabled(&self) -> bool;

    /// 로그에 쓰이는 채널 이름.
    fn name(&self) -> &str;
}
