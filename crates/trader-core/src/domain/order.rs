//! 주문 타입.
//!
//! 이 모듈은 실행 거래소에 전달되는 주문 관련 타입을 정의합니다:
//! - `Side` - 주문 방향 (매수/매도)
//! - `OrderRequest` - 시장가 주문 요청 (선택적 손절가 포함)
//! - `OrderReceipt` - 거래소의 주문 접수 결과

use crate::types::{Price, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 주문 방향 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수 (롱 진입)
    Buy,
    /// 매도 (숏 진입 또는 청산)
    Sell,
}

impl Side {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// 소문자 표기 (`buy` / `sell`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 거래소에 제출하는 시장가 주문 요청.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// 거래 심볼
    pub symbol: String,
    /// 주문 방향
    pub side: Side,
    /// 주문 수량
    pub quantity: Quantity,
    /// 손절가 (거래소가 브라켓 주문을 지원하는 경우 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Price>,
    /// 익절가 (브라켓 주문)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Price>,
}

impl OrderRequest {
    /// 시장가 주문을 생성합니다.
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Quantity) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            stop_loss: None,
            take_profit: None,
        }
    }

    /// 손절가를 설정합니다.
    pub fn with_stop_loss(mut self, stop_loss: Price) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    /// 익절가를 설정합니다.
    pub fn with_take_profit(mut self, take_profit: Price) -> Self {
        self.take_profit = Some(take_profit);
        self
    }
}

/// 거래소의 주문 접수 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// 거래소 주문 ID
    pub order_id: String,
    /// 거래 심볼
    pub symbol: String,
    /// 주문 방향
    pub side: Side,
    /// 접수 수량
    pub quantity: Quantity,
    /// 접수 시각
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.as_str(), "sell");
        assert_eq!(Side::Buy.to_string(), "BUY");
    }

    #[test]
    fn test_order_request_builder() {
        let order = OrderRequest::market("AAPL", Side::Buy, dec!(5)).with_stop_loss(dec!(97));

        assert_eq!(order.symbol, "AAPL");
        assert_eq!(order.quantity, dec!(5));
        assert_eq!(order.stop_loss, Some(dec!(97)));
        assert!(order.take_profit.is_none());
    }
}
