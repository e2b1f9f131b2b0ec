//! 체결 기록.
//!
//! 실행 성공 시 포트폴리오 저장소로 전달되는 기록과
//! 청산 결과를 정의합니다.

use crate::domain::Side;
use crate::types::{Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 성공적으로 제출된 진입 주문의 기록.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// 거래소 주문 ID
    pub order_id: String,
    /// 거래 심볼
    pub symbol: String,
    /// 주문 방향
    pub side: Side,
    /// 체결 수량
    pub quantity: Quantity,
    /// 진입 기준 가격
    pub entry_price: Price,
    /// 손절가
    pub stop_loss: Price,
    /// 포지션 가치 (수량 × 기준 가격)
    pub position_value: Decimal,
    /// 시그널 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 진입 사유
    pub reason: String,
    /// 진입 시각
    pub opened_at: DateTime<Utc>,
}

/// 청산된 포지션의 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    /// 거래 심볼
    pub symbol: String,
    /// 청산 가격
    pub exit_price: Price,
    /// 실현 손익
    pub pnl: Decimal,
}

impl ClosedPosition {
    /// 새 청산 결과를 생성합니다.
    pub fn new(symbol: impl Into<String>, exit_price: Price, pnl: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            exit_price,
            pnl,
        }
    }
}
