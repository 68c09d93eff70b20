//! 심볼별 돌파 상태 머신.
//!
//! 상태는 `중립 / 지지 이탈 / 저항 돌파` 세 가지이며, 두 플래그는 동시에 참일 수 없습니다.
//! 같은 방향의 돌파는 `reset()` 전까지 한 번만 알림을 생성합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::LevelPair;

/// 돌파 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutKind {
    /// 지지선 하향 이탈
    SupportBroken,
    /// 저항선 상향 돌파
    ResistanceBroken,
}

impl fmt::Display for BreakoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakoutKind::SupportBroken => f.write_str("support_broken"),
            BreakoutKind::ResistanceBroken => f.write_str("resistance_broken"),
        }
    }
}

/// 상태 전이 시 한 번 생성되는 알림.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutAlert {
    pub symbol: String,
    pub kind: BreakoutKind,
    /// 돌파된 레벨
    pub level: Decimal,
    /// 돌파를 감지한 가격
    pub price: Decimal,
    pub message: String,
    pub detected_at: DateTime<Utc>,
}

/// 심볼별 돌파 상태.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakoutState {
    pub support_broken: bool,
    pub resistance_broken: bool,
    /// 마지막 전이 메시지 (중립이면 빈 문자열)
    pub message: String,
    pub broken_level: Option<Decimal>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BreakoutState {
    /// 중립 상태.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_neutral(&self) -> bool {
        !self.support_broken && !self.resistance_broken
    }

    /// 중립으로 되돌립니다 (새 레벨 계산 시).
    pub fn reset(&mut self) {
        *self = Self::neutral();
    }

    /// 현재가를 평가하여 전이가 일어나면 알림을 반환합니다.
    ///
    /// 가장 가까운 지지/저항 레벨을 기준으로 하며, 레벨이 없으면 해당 방향은 평가하지 않습니다.
    pub fn on_price(
        &mut self,
        symbol: &str,
        price: Decimal,
        levels: &LevelPair,
    ) -> Option<BreakoutAlert> {
        let crossed = match (levels.nearest_support, levels.nearest_resistance) {
            (Some(support), _) if price < support && !self.support_broken => {
                Some((BreakoutKind::SupportBroken, support))
            }
            (_, Some(resistance)) if price > resistance && !self.resistance_broken => {
                Some((BreakoutKind::ResistanceBroken, resistance))
            }
            _ => None,
        };

        let (kind, level) = crossed?;
        let now = Utc::now();
        let message = match kind {
            BreakoutKind::SupportBroken => format!(
                "{} 지지선 {} 하향 이탈 (현재가 {})",
                symbol,
                level.normalize(),
                price.normalize()
            ),
            BreakoutKind::ResistanceBroken => format!(
                "{} 저항선 {} 상향 돌파 (현재가 {})",
                symbol,
                level.normalize(),
                price.normalize()
            ),
        };

        self.support_broken = kind == BreakoutKind::SupportBroken;
        self.resistance_broken = kind == BreakoutKind::ResistanceBroken;
        self.message = message.clone();
        self.broken_level = Some(level);
        self.updated_at = Some(now);

        Some(BreakoutAlert {
            symbol: symbol.to_string(),
            kind,
            level,
            price,
            message,
            detected_at: now,
        })
    }
}
