//! 텔레그램 알림 서비스.
//!
//! Telegram Bot API(`sendMessage`)로 돌파 알림과 분석 요약을 전송합니다.
//! 봇 토큰과 채팅 ID는 `[notifications.telegram]` 설정 섹션에서 읽으며,
//! 둘 중 하나라도 비어 있으면 전송기는 비활성 상태가 됩니다.

use crate::types::{
    Notification, NotificationError, NotificationEvent, NotificationPriority, NotificationResult,
    NotificationSender,
};
use async_trait::async_trait;
use chartwatch_core::TelegramSettings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{debug, error, warn};

/// 기본 Bot API 주소.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// 429 응답에 `retry_after`가 없을 때 사용하는 대기 시간(초).
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 텔레그램 알림 전송 설정.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub enabled: bool,
    /// 메시지 파싱 모드. 포맷터가 HTML 태그를 쓰므로 기본값은 `HTML`.
    pub parse_mode: String,
    /// Bot API 주소 (테스트에서 mock 서버로 교체)
    pub api_base: String,
}

impl TelegramConfig {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            enabled: true,
            parse_mode: "HTML".to_string(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    /// 애플리케이션 설정에서 생성합니다.
    pub fn from_settings(settings: &TelegramSettings) -> Self {
        let mut config = Self::new(settings.bot_token.clone(), settings.chat_id.clone());
        config.enabled = settings.enabled;
        config
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

/// `sendMessage` 요청 본문.
#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Bot API 오류 응답 중 재시도 대기 시간만 읽습니다.
#[derive(Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

impl ApiErrorBody {
    fn retry_after(body: &str) -> u64 {
        serde_json::from_str::<ApiErrorBody>(body)
            .unwrap_or_default()
            .parameters
            .and_then(|p| p.retry_after)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
    }
}

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// 알림을 HTML 메시지 본문으로 렌더링합니다.
    fn format_message(&self, notification: &Notification) -> String {
        let mut text = String::new();

        match &notification.event {
            NotificationEvent::Breakout {
                symbol,
                kind,
                level,
                price,
                message,
            } => {
                let heading = match kind.as_str() {
                    "support_broken" => "🔻 <b>지지선 이탈</b>",
                    _ => "🔺 <b>저항선 돌파</b>",
                };
                let _ = writeln!(text, "{heading}\n");
                let _ = writeln!(text, "심볼: <code>{}</code>", escape_html(symbol));
                push_decimal_line(&mut text, "레벨", *level);
                push_decimal_line(&mut text, "현재가", *price);
                let _ = write!(text, "\n{}", escape_html(message));
            }
            NotificationEvent::AnalysisCompleted {
                analyzed,
                no_data,
                failed,
                elapsed_ms,
            } => {
                let _ = writeln!(text, "{} <b>분석 완료</b>\n", marker(notification.priority));
                let _ = writeln!(text, "분석: {analyzed}개 / 데이터 없음: {no_data}개");
                let _ = writeln!(text, "실패: {failed}개");
                let _ = write!(text, "소요: {elapsed_ms}ms");
            }
            NotificationEvent::SystemError {
                error_code,
                message,
            } => {
                let _ = writeln!(text, "{} <b>시스템 오류</b>\n", marker(notification.priority));
                let _ = writeln!(text, "코드: <code>{}</code>", escape_html(error_code));
                let _ = write!(text, "{}", escape_html(message));
            }
            NotificationEvent::Custom { title, message } => {
                let _ = write!(
                    text,
                    "{} <b>{}</b>\n\n{}",
                    marker(notification.priority),
                    escape_html(title),
                    escape_html(message)
                );
            }
        }

        let _ = write!(
            text,
            "\n\n<i>{}</i>",
            notification.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
        text
    }

    async fn post(&self, text: &str) -> NotificationResult<()> {
        let request = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: &self.config.parse_mode,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(chat_id = %self.config.chat_id, "텔레그램 전송 완료");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = ApiErrorBody::retry_after(&body);
            warn!(retry_after, "텔레그램 요청 한도 초과");
            return Err(NotificationError::RateLimited(retry_after));
        }

        error!(status = status.as_u16(), body = %body, "텔레그램 전송 실패");
        Err(NotificationError::SendFailed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )))
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let text = self.format_message(notification);
        self.post(&text).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

/// 우선순위 표시 기호.
fn marker(priority: NotificationPriority) -> &'static str {
    match priority {
        NotificationPriority::Low => "✅",
        NotificationPriority::Normal => "📈",
        NotificationPriority::High => "❗",
        NotificationPriority::Critical => "⛔",
    }
}

fn push_decimal_line(text: &mut String, label: &str, value: Decimal) {
    let _ = writeln!(text, "{label}: {}", value.normalize());
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// 여러 전송기를 관리하는 알림 관리자.
#[derive(Default)]
pub struct NotificationManager {
    senders: Vec<Box<dyn NotificationSender>>,
}

impl NotificationManager {
    /// 새 알림 관리자를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정에서 활성화된 전송기로 구성합니다.
    pub fn from_settings(telegram: &TelegramSettings) -> Self {
        let mut manager = Self::new();
        let sender = TelegramSender::new(TelegramConfig::from_settings(telegram));
        if sender.is_enabled() {
            manager.add_sender(sender);
        }
        manager
    }

    /// 알림 전송기를 추가합니다.
    pub fn add_sender<S: NotificationSender + 'static>(&mut self, sender: S) {
        self.senders.push(Box::new(sender));
    }

    /// 활성화된 전송기 수.
    pub fn enabled_count(&self) -> usize {
        self.senders.iter().filter(|s| s.is_enabled()).count()
    }

    /// 활성화된 모든 전송기로 알림을 보냅니다.
    ///
    /// 한 곳이라도 전달되면 성공입니다. 전부 실패한 경우 마지막 에러를 반환합니다.
    pub async fn notify(&self, notification: &Notification) -> NotificationResult<()> {
        let mut outcome: Option<NotificationResult<()>> = None;

        for sender in self.senders.iter().filter(|s| s.is_enabled()) {
            let result = sender.send(notification).await;
            if let Err(e) = &result {
                error!(sender = sender.name(), error = %e, "알림 전송 실패");
            }
            outcome = match (outcome, result) {
                (Some(Ok(())), _) | (_, Ok(())) => Some(Ok(())),
                (_, Err(e)) => Some(Err(e)),
            };
        }

        outcome.unwrap_or(Ok(()))
    }

    /// 돌파 알림을 전송합니다.
    pub async fn notify_breakout(
        &self,
        symbol: &str,
        kind: &str,
        level: Decimal,
        price: Decimal,
        message: &str,
    ) -> NotificationResult<()> {
        let notification = Notification::new(NotificationEvent::Breakout {
            symbol: symbol.to_string(),
            kind: kind.to_string(),
            level,
            price,
            message: message.to_string(),
        })
        .with_priority(NotificationPriority::High);

        self.notify(&notification).await
    }

    /// 분석 패스 요약을 전송합니다.
    pub async fn notify_analysis_completed(
        &self,
        analyzed: usize,
        no_data: usize,
        failed: usize,
        elapsed_ms: u64,
    ) -> NotificationResult<()> {
        let priority = if failed > 0 {
            NotificationPriority::Normal
        } else {
            NotificationPriority::Low
        };
        let notification = Notification::new(NotificationEvent::AnalysisCompleted {
            analyzed,
            no_data,
            failed,
            elapsed_ms,
        })
        .with_priority(priority);

        self.notify(&notification).await
    }

    /// 시스템 오류 알림을 전송합니다.
    pub async fn notify_system_error(
        &self,
        error_code: &str,
        message: &str,
    ) -> NotificationResult<()> {
        let notification = Notification::new(NotificationEvent::SystemError {
            error_code: error_code.to_string(),
            message: message.to_string(),
        })
        .with_priority(NotificationPriority::Critical);

        self.notify(&notification).await
    }
}
