//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 설정값(퍼센트)은 `f64`로, 금액/가격/수량은 `Decimal`로 다룹니다.
//! 두 세계를 잇는 변환은 이 모듈의 정수 스케일링 헬퍼를 통해서만 수행합니다.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 주문 수량을 위한 타입.
pub type Quantity = Decimal;

/// 정밀도를 위해 정수 연산을 사용하여 퍼센트를 금액으로 변환.
/// 예시: pct_to_amount(1000, 10.0) = 100 (1000의 10%)
pub fn pct_to_amount(amount: Decimal, pct: f64) -> Decimal {
    // 퍼센트의 소수점 4자리까지 지원 (10.5% -> 105000)
    let scaled_pct = (pct * 10000.0).round() as i64;
    (amount * Decimal::from(scaled_pct)) / Decimal::from(1_000_000)
}

/// 정수 연산을 사용하여 가격에 백분율 조정을 적용.
/// 예시: apply_pct(50000, -2.0) = 49000 (2% 감소)
/// 예시: apply_pct(50000, 5.0) = 52500 (5% 증가)
pub fn apply_pct(price: Decimal, pct: f64) -> Decimal {
    // price * (1 + pct/100) = price * (100 + pct) / 100
    let scaled_factor = ((100.0 + pct) * 10000.0).round() as i64;
    (price * Decimal::from(scaled_factor)) / Decimal::from(1_000_000)
}

/// `part / whole * 100`을 f64로 반환합니다. `whole`이 0 이하면 0.
pub fn ratio_pct(part: Decimal, whole: Decimal) -> f64 {
    if whole <= Decimal::ZERO {
        return 0.0;
    }
    (part / whole * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}

/// f64 비율(또는 퍼센트)을 Decimal로 변환합니다. NaN/무한대는 0.
pub fn decimal_from_f64(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 지정된 소수점 자릿수에서 0 방향으로 절사합니다.
    ///
    /// 수량 계산에 사용하며, 절사 후 명목 가치가 원래 금액을 넘지 않습니다.
    fn truncate_to(&self, dp: u32) -> Decimal;

    /// 로그 출력을 위해 f64로 변환합니다.
    fn as_f64(&self) -> f64;
}

impl DecimalExt for Decimal {
    fn truncate_to(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
    }

    fn as_f64(&self) -> f64 {
        self.to_f64().unwrap_or(0.0)
    }
}
