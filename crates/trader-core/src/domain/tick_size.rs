//! 호가 단위(Tick Size) 처리 모듈.
//!
//! 손절가/익절가처럼 계산으로 만들어진 가격을 호가 단위에 맞게 라운딩합니다.

use rust_decimal::{Decimal, RoundingStrategy};

/// 호가 단위 라운딩 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMethod {
    /// 반올림 (중간값은 0에서 멀어지는 방향)
    Round,
    /// 내림
    Floor,
    /// 올림
    Ceil,
}

/// 호가 단위 제공자 trait
pub trait TickSizeProvider: Send + Sync {
    /// 주어진 가격에 대한 호가 단위를 반환합니다.
    fn tick_size(&self, price: Decimal) -> Decimal;

    /// 가격을 호가 단위로 라운딩합니다.
    fn round_to_tick(&self, price: Decimal, method: RoundMethod) -> Decimal {
        let tick = self.tick_size(price);
        if tick.is_zero() {
            return price;
        }

        let ticks = price / tick;
        let rounded_ticks = match method {
            RoundMethod::Round => {
                ticks.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
            RoundMethod::Floor => ticks.floor(),
            RoundMethod::Ceil => ticks.ceil(),
        };

        (rounded_ticks * tick).normalize()
    }
}

/// 가격 구간별 호가 단위.
///
/// $1 이상은 `10^-decimals`, $1 미만은 두 자리 더 세밀한 단위를 사용합니다
/// (`decimals = 2`이면 $0.01 / $0.0001, 미국 주식의 서브페니 규칙과 동일).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieredTickSize {
    decimals: u32,
}

impl TieredTickSize {
    /// $1 이상 구간의 소수점 자릿수로 생성합니다.
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }
}

impl Default for TieredTickSize {
    fn default() -> Self {
        Self::new(2)
    }
}

impl TickSizeProvider for TieredTickSize {
    fn tick_size(&self, price: Decimal) -> Decimal {
        if price.abs() < Decimal::ONE {
            Decimal::new(1, self.decimals + 2)
        } else {
            Decimal::new(1, self.decimals)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tiered_tick_size() {
        let provider = TieredTickSize::default();

        assert_eq!(provider.tick_size(dec!(190)), dec!(0.01));
        assert_eq!(provider.tick_size(dec!(1)), dec!(0.01));
        assert_eq!(provider.tick_size(dec!(0.9999)), dec!(0.0001));
        assert_eq!(provider.tick_size(dec!(0.08)), dec!(0.0001));

        assert_eq!(TieredTickSize::new(4).tick_size(dec!(0.5)), dec!(0.000001));
    }

    #[test]
    fn test_round_to_tick() {
        let provider = TieredTickSize::default();

        assert_eq!(
            provider.round_to_tick(dec!(123.456), RoundMethod::Round),
            dec!(123.46)
        );
        assert_eq!(
            provider.round_to_tick(dec!(123.456), RoundMethod::Floor),
            dec!(123.45)
        );
        // 서브달러: 0.08 * 0.98 = 0.0784
        assert_eq!(
            provider.round_to_tick(dec!(0.0784), RoundMethod::Round),
            dec!(0.0784)
        );
        assert_eq!(
            provider.round_to_tick(dec!(0.077612), RoundMethod::Ceil),
            dec!(0.0777)
        );
    }
}
