//! # Chartwatch Notification
//!
//! 차트 감시 알림 서비스.
//!
//! 지원 채널:
//! - Telegram
//!
//! 전송 실패는 감시 루프를 멈추지 않습니다. 호출자는 에러를 로깅만 합니다.

pub mod telegram;
pub mod types;

pub use telegram::*;
pub use types::*;
