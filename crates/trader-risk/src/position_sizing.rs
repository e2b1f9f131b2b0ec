//! 포지션 크기 계산.
//!
//! 제공 기능:
//! - 신뢰도를 승률로 사용하는 쿼터 Kelly 비율
//! - 자본 대비 최대 포지션 크기 상한
//! - 자산 클래스별 수량 단위 (주식은 정수, 암호화폐는 소수점 4자리)
//!
//! 수량은 항상 0 방향으로 절사되므로 포지션 가치는 상한을 넘지 않습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{decimal_from_f64, pct_to_amount, AssetClass, DecimalExt, Price, Quantity};

use crate::config::RiskConfig;

/// 포지션 크기 계산 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SizingResult {
    /// 주문 가능한 크기
    Sized {
        /// 수량
        shares: Quantity,
        /// 포지션 가치 (수량 × 기준 가격)
        position_value: Decimal,
    },
    /// 수량이 0으로 절사됨 (에러 아님, 건너뜀)
    Zero,
}

impl SizingResult {
    /// 0 크기 여부.
    pub fn is_zero(&self) -> bool {
        matches!(self, SizingResult::Zero)
    }

    /// 수량. 0 크기면 0.
    pub fn shares(&self) -> Quantity {
        match self {
            SizingResult::Sized { shares, .. } => *shares,
            SizingResult::Zero => Decimal::ZERO,
        }
    }

    /// 포지션 가치. 0 크기면 0.
    pub fn position_value(&self) -> Decimal {
        match self {
            SizingResult::Sized { position_value, .. } => *position_value,
            SizingResult::Zero => Decimal::ZERO,
        }
    }
}

/// Kelly 기반 포지션 사이저.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    payoff_ratio: f64,
    kelly_cap: f64,
    max_position_size_pct: f64,
    fractional_decimals: u32,
}

impl PositionSizer {
    /// 설정으로부터 사이저를 생성합니다.
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            payoff_ratio: config.kelly_payoff_ratio,
            kelly_cap: config.kelly_cap,
            max_position_size_pct: config.max_position_size_pct,
            fractional_decimals: config.fractional_decimals,
        }
    }

    /// Kelly 비율: `(b·p − (1−p)) / b`, `[0, cap]`으로 제한.
    ///
    /// 신뢰도는 `[0, 1]`로 먼저 제한됩니다.
    pub fn kelly_fraction(&self, confidence: f64) -> f64 {
        let p = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let b = self.payoff_ratio;
        let kelly = (b * p - (1.0 - p)) / b;
        kelly.clamp(0.0, self.kelly_cap)
    }

    /// 자본 대비 최대 포지션 가치.
    pub fn max_position_value(&self, capital: Decimal) -> Decimal {
        pct_to_amount(capital, self.max_position_size_pct)
    }

    /// 포지션 크기를 계산합니다.
    ///
    /// # 인자
    /// * `symbol` - 거래 심볼 (수량 단위 결정용)
    /// * `confidence` - 시그널 신뢰도 (0.0 ~ 1.0)
    /// * `price` - 기준 가격
    /// * `capital` - 현재 자본
    pub fn size(
        &self,
        symbol: &str,
        confidence: f64,
        price: Price,
        capital: Decimal,
    ) -> SizingResult {
        if price <= Decimal::ZERO || capital <= Decimal::ZERO {
            return SizingResult::Zero;
        }

        let kelly_value = capital * decimal_from_f64(self.kelly_fraction(confidence));
        let target_value = kelly_value.min(self.max_position_value(capital));

        let raw_shares = target_value / price;
        let shares = if AssetClass::classify(symbol).is_fractional() {
            raw_shares.truncate_to(self.fractional_decimals)
        } else {
            raw_shares.trunc()
        };

        if shares <= Decimal::ZERO {
            return SizingResult::Zero;
        }

        SizingResult::Sized {
            shares,
            position_value: shares * price,
        }
    }
}
