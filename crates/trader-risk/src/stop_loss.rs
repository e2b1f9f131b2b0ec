//! 손절매 및 이익실현 가격 계산.
//!
//! 제공 기능:
//! - 진입 방향에 따른 고정 비율 손절가
//! - 브라켓 주문용 이익실현가
//!
//! 모든 가격은 가격 구간별 호가 단위로 라운딩됩니다. 라운딩 결과가
//! 진입가와 겹치면 손절가를 손실 방향으로 한 틱 옮깁니다.

use crate::config::RiskConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{apply_pct, Price, RoundMethod, Side, TickSizeProvider, TieredTickSize};

/// 진입 주문의 보호 가격.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveLevels {
    /// 손절가
    pub stop_loss: Price,
    /// 이익실현가
    pub take_profit: Price,
}

impl ProtectiveLevels {
    /// 위험 대비 보상 비율 (진입가 기준).
    pub fn risk_reward_ratio(&self, entry_price: Price) -> Option<Decimal> {
        let risk = (entry_price - self.stop_loss).abs();
        if risk.is_zero() {
            return None;
        }
        Some((self.take_profit - entry_price).abs() / risk)
    }
}

/// 손절/익절 가격 계산기.
#[derive(Debug, Clone)]
pub struct StopLossCalculator {
    stop_loss_pct: f64,
    take_profit_pct: f64,
    ticks: TieredTickSize,
}

impl StopLossCalculator {
    /// 설정으로부터 계산기를 생성합니다.
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            stop_loss_pct: config.max_stop_loss_pct,
            take_profit_pct: config.take_profit_pct,
            ticks: TieredTickSize::new(config.price_decimals),
        }
    }

    /// 손절가 계산.
    ///
    /// 롱(매수) 진입은 진입가보다 엄격히 아래, 숏(매도) 진입은 엄격히 위에 위치합니다.
    pub fn stop_price(&self, entry_price: Price, side: Side) -> Price {
        let pct = match side {
            Side::Buy => -self.stop_loss_pct,
            Side::Sell => self.stop_loss_pct,
        };
        let raw = apply_pct(entry_price, pct);
        let stop = self.ticks.round_to_tick(raw, RoundMethod::Round);

        match side {
            Side::Buy if stop >= entry_price || stop <= Decimal::ZERO => {
                let stepped = self.ticks.round_to_tick(entry_price, RoundMethod::Ceil)
                    - self.ticks.tick_size(entry_price);
                // 한 틱 아래가 0 이하면 라운딩 전 값을 사용
                if stepped > Decimal::ZERO {
                    stepped
                } else {
                    raw
                }
            }
            Side::Sell if stop <= entry_price => {
                self.ticks.round_to_tick(entry_price, RoundMethod::Floor)
                    + self.ticks.tick_size(entry_price)
            }
            _ => stop,
        }
    }

    /// 이익실현가 계산.
    pub fn take_profit_price(&self, entry_price: Price, side: Side) -> Price {
        let pct = match side {
            Side::Buy => self.take_profit_pct,
            Side::Sell => -self.take_profit_pct,
        };
        self.ticks
            .round_to_tick(apply_pct(entry_price, pct), RoundMethod::Round)
    }

    /// 손절가와 이익실현가를 함께 계산합니다.
    pub fn protective_levels(&self, entry_price: Price, side: Side) -> ProtectiveLevels {
        ProtectiveLevels {
            stop_loss: self.stop_price(entry_price, side),
            take_profit: self.take_profit_price(entry_price, side),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn calculator() -> StopLossCalculator {
        StopLossCalculator::new(&RiskConfig::default())
    }

    #[test]
    fn test_stop_price_long() {
        assert_eq!(calculator().stop_price(dec!(100), Side::Buy), dec!(97));
        assert_eq!(calculator().stop_price(dec!(50000), Side::Buy), dec!(48500));
    }

    #[test]
    fn test_stop_price_short() {
        assert_eq!(calculator().stop_price(dec!(100), Side::Sell), dec!(103));
    }

    #[test]
    fn test_stop_price_rounding() {
        // 123.45 * 0.97 = 119.7465 -> 119.75
        assert_eq!(calculator().stop_price(dec!(123.45), Side::Buy), dec!(119.75));
    }

    #[test]
    fn test_protective_levels() {
        let levels = calculator().protective_levels(dec!(200), Side::Buy);

        assert_eq!(levels.stop_loss, dec!(194));
        assert_eq!(levels.take_profit, dec!(220));
        // 20 / 6
        let ratio = levels.risk_reward_ratio(dec!(200)).unwrap();
        assert!(ratio > dec!(3.33) && ratio < dec!(3.34));
    }

    #[test]
    fn test_custom_stop_percentage() {
        let config = RiskConfig {
            max_stop_loss_pct: 5.0,
            ..Default::default()
        };
        let calc = StopLossCalculator::new(&config);
        assert_eq!(calc.stop_price(dec!(100), Side::Buy), dec!(95));
        assert_eq!(calc.stop_price(dec!(100), Side::Sell), dec!(105));
    }

    #[test]
    fn test_sub_dollar_stop_uses_finer_tick() {
        // 0.08 * 0.97 = 0.0776, 0.08 * 1.03 = 0.0824
        assert_eq!(calculator().stop_price(dec!(0.08), Side::Buy), dec!(0.0776));
        assert_eq!(calculator().stop_price(dec!(0.08), Side::Sell), dec!(0.0824));

        let levels = calculator().protective_levels(dec!(0.08), Side::Buy);
        assert!(levels.stop_loss < dec!(0.08));
        assert_eq!(levels.take_profit, dec!(0.088));
    }

    #[test]
    fn test_stop_steps_one_tick_when_rounding_collapses() {
        // 0.0010 * 0.97 = 0.00097 -> 0.0010 (진입가와 같음) -> 한 틱 아래
        assert_eq!(calculator().stop_price(dec!(0.001), Side::Buy), dec!(0.0009));
        assert_eq!(calculator().stop_price(dec!(0.001), Side::Sell), dec!(0.0011));

        // 한 틱 아래가 0이면 라운딩 전 값
        assert_eq!(calculator().stop_price(dec!(0.0001), Side::Buy), dec!(0.000097));
        assert_eq!(calculator().stop_price(dec!(0.0001), Side::Sell), dec!(0.0002));
    }

    proptest! {
        #[test]
        fn prop_stop_is_on_losing_side(bps in 1i64..100_000_000i64) {
            // 0.0001 ~ 10000.0000
            let entry = Decimal::new(bps, 4);
            let calc = calculator();

            let long_stop = calc.stop_price(entry, Side::Buy);
            let short_stop = calc.stop_price(entry, Side::Sell);
            prop_assert!(long_stop > Decimal::ZERO);
            prop_assert!(long_stop < entry, "long stop {} not below entry {}", long_stop, entry);
            prop_assert!(short_stop > entry, "short stop {} not above entry {}", short_stop, entry);

            // 거리 = 진입가의 3% (한 틱 이내)
            let expected = entry * dec!(0.03);
            let tolerance = TieredTickSize::default().tick_size(short_stop);
            prop_assert!(((entry - long_stop) - expected).abs() <= tolerance);
            prop_assert!(((short_stop - entry) - expected).abs() <= tolerance);
        }
    }
}
