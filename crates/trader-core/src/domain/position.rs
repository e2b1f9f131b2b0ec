//! 라이브 포지션 미러.
//!
//! 이 모듈은 실행 거래소가 보고하는 포지션 상태를 정의합니다:
//! - `Position` - 개별 포지션 (코어는 생성하지 않고 읽고 반응만 함)
//! - `AccountSnapshot` - 계좌 자산 요약

use crate::types::{AssetClass, Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 거래소가 보고하는 오픈 포지션.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// 거래 심볼
    pub symbol: String,
    /// 보유 수량
    pub qty: Quantity,
    /// 평균 진입 가격
    pub entry_price: Price,
    /// 현재 시장 가격
    pub current_price: Price,
    /// 현재 시장 가치
    pub market_value: Decimal,
    /// 미실현 손익
    pub unrealized_pnl: Decimal,
    /// 미실현 손익률 (%, 예: -3.5는 -3.5%)
    pub unrealized_pnl_pct: Decimal,
}

impl Position {
    /// 수량과 가격으로부터 파생 필드를 계산해 롱 포지션을 생성합니다.
    pub fn long(
        symbol: impl Into<String>,
        qty: Quantity,
        entry_price: Price,
        current_price: Price,
    ) -> Self {
        let cost = qty * entry_price;
        let market_value = qty * current_price;
        let unrealized_pnl = market_value - cost;
        let unrealized_pnl_pct = if cost.is_zero() {
            Decimal::ZERO
        } else {
            unrealized_pnl / cost * Decimal::ONE_HUNDRED
        };

        Self {
            symbol: symbol.into(),
            qty,
            entry_price,
            current_price,
            market_value,
            unrealized_pnl,
            unrealized_pnl_pct,
        }
    }

    /// 심볼로 추정한 자산 클래스.
    pub fn asset_class(&self) -> AssetClass {
        AssetClass::classify(&self.symbol)
    }
}

/// 계좌 자산 요약.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// 총 자산
    pub equity: Decimal,
    /// 현금
    pub cash: Decimal,
    /// 포트폴리오 총 가치
    pub portfolio_value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_long_position_pnl() {
        let position = Position::long("AAPL", dec!(10), dec!(100), dec!(96.5));

        assert_eq!(position.market_value, dec!(965));
        assert_eq!(position.unrealized_pnl, dec!(-35));
        assert_eq!(position.unrealized_pnl_pct, dec!(-3.5));
        assert_eq!(position.asset_class(), AssetClass::Stock);
    }

    #[test]
    fn test_zero_cost_position() {
        let position = Position::long("BTC/USD", Decimal::ZERO, dec!(50000), dec!(51000));
        assert_eq!(position.unrealized_pnl_pct, Decimal::ZERO);
        assert_eq!(position.asset_class(), AssetClass::Crypto);
    }
}
