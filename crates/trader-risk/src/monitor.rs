//! 오픈 포지션 리스크 모니터.
//!
//! 거래소가 보고하는 라이브 포지션을 검사하여 청산이 필요한 포지션을 찾습니다.
//! 손절 기준은 설정된 `max_stop_loss_pct`, 익절 기준은 독립된 `take_profit_pct`입니다.
//!
//! 이 모듈은 판정만 수행하며 실제 청산은 실행 계층이 담당합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use trader_core::{decimal_from_f64, Position, Price};

use crate::config::RiskConfig;

/// 청산 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// 손절
    StopLoss,
    /// 익절
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// 청산 요청.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSignal {
    /// 심볼
    pub symbol: String,
    /// 청산 사유
    pub reason: ExitReason,
    /// 판정 시점의 미실현 손익률 (%)
    pub pnl_pct: Decimal,
    /// 판정 시점의 현재가 (청산 기록용)
    pub exit_price: Price,
    /// 판정 시점의 미실현 손익
    pub unrealized_pnl: Decimal,
}

/// 손절/익절 모니터.
#[derive(Debug, Clone)]
pub struct RiskMonitor {
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
}

impl RiskMonitor {
    /// 설정으로부터 모니터를 생성합니다.
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            stop_loss_pct: decimal_from_f64(config.max_stop_loss_pct),
            take_profit_pct: decimal_from_f64(config.take_profit_pct),
        }
    }

    /// 단일 포지션 검사.
    ///
    /// 손절 조건(`pnl% ≤ −stop`)을 익절 조건(`pnl% ≥ +take`)보다 먼저 확인합니다.
    pub fn check(&self, position: &Position) -> Option<ExitSignal> {
        let pnl_pct = position.unrealized_pnl_pct;

        let reason = if pnl_pct <= -self.stop_loss_pct {
            ExitReason::StopLoss
        } else if pnl_pct >= self.take_profit_pct {
            ExitReason::TakeProfit
        } else {
            return None;
        };

        Some(ExitSignal {
            symbol: position.symbol.clone(),
            reason,
            pnl_pct,
            exit_price: position.current_price,
            unrealized_pnl: position.unrealized_pnl,
        })
    }

    /// 모든 포지션을 검사하여 청산 요청 목록을 반환합니다.
    pub fn scan(&self, positions: &[Position]) -> Vec<ExitSignal> {
        positions.iter().filter_map(|p| self.check(p)).collect()
    }
}
