//! 거래 검증.
//!
//! 신규 진입 전 순차적으로 리스크 규칙을 확인합니다:
//! 1. 일일 손실 게이트
//! 2. 매수 시 포지션 크기 한도
//! 3. 매수 시 자본 충분 여부
//!
//! 첫 번째로 실패한 검사에서 즉시 거부합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use trader_core::{ratio_pct, Side};

use crate::limits::GateDecision;

/// 거부 사유.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectReason {
    /// 일일 손실 한도 도달
    DailyLossLimit { loss_pct: f64, max_pct: f64 },
    /// 포지션 크기 한도 초과
    PositionSizeExceeded { position_pct: f64, max_pct: f64 },
    /// 자본 부족
    InsufficientCapital { capital: Decimal, required: Decimal },
}

impl RejectReason {
    /// 안정적인 사유 코드.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::DailyLossLimit { .. } => "daily_loss_limit",
            RejectReason::PositionSizeExceeded { .. } => "position_size_exceeded",
            RejectReason::InsufficientCapital { .. } => "insufficient_capital",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::DailyLossLimit { loss_pct, max_pct } => write!(
                f,
                "Daily loss limit reached: {:.2}% (max: {:?}%)",
                loss_pct, max_pct
            ),
            RejectReason::PositionSizeExceeded {
                position_pct,
                max_pct,
            } => write!(
                f,
                "Position size {:.2}% exceeds limit {:?}%",
                position_pct, max_pct
            ),
            RejectReason::InsufficientCapital { capital, required } => write!(
                f,
                "Insufficient capital: ${:.2} < ${:.2}",
                capital, required
            ),
        }
    }
}

/// 검증 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum ValidationResult {
    /// 모든 검사 통과
    Accepted,
    /// 거부됨
    Rejected(RejectReason),
}

impl ValidationResult {
    /// 통과 여부.
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted)
    }

    /// 거부 사유.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            ValidationResult::Accepted => None,
            ValidationResult::Rejected(reason) => Some(*reason),
        }
    }

    /// 사유 코드 (`accepted` 또는 거부 코드).
    pub fn code(&self) -> &'static str {
        match self {
            ValidationResult::Accepted => "accepted",
            ValidationResult::Rejected(reason) => reason.code(),
        }
    }

    /// 사람이 읽을 수 있는 메시지.
    pub fn message(&self) -> String {
        match self {
            ValidationResult::Accepted => "Trade validated".to_string(),
            ValidationResult::Rejected(reason) => reason.to_string(),
        }
    }
}

/// 거래 검증기.
#[derive(Debug, Clone)]
pub struct TradeValidator {
    max_position_size_pct: f64,
}

impl TradeValidator {
    /// 새 검증기 생성.
    pub fn new(max_position_size_pct: f64) -> Self {
        Self {
            max_position_size_pct,
        }
    }

    /// 거래를 검증합니다.
    ///
    /// 포지션 크기와 자본 검사는 매수에만 적용됩니다.
    pub fn validate(
        &self,
        gate: GateDecision,
        side: Side,
        position_value: Decimal,
        capital: Decimal,
    ) -> ValidationResult {
        if let Some(reason) = gate.reject_reason() {
            return ValidationResult::Rejected(reason);
        }

        if side == Side::Buy {
            let position_pct = ratio_pct(position_value, capital);
            if position_pct > self.max_position_size_pct {
                return ValidationResult::Rejected(RejectReason::PositionSizeExceeded {
                    position_pct,
                    max_pct: self.max_position_size_pct,
                });
            }

            if position_value > capital {
                return ValidationResult::Rejected(RejectReason::InsufficientCapital {
                    capital,
                    required: position_value,
                });
            }
        }

        ValidationResult::Accepted
    }
}
