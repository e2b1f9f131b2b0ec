//! 자산 배분 점검.
//!
//! 암호화폐/주식 비중을 계산하고 과대 비중을 알립니다.
//! 권고만 생성하며 주문은 내지 않습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{ratio_pct, AssetClass, Position};

/// 목표 배분 및 과대 비중 기준 (0.0 ~ 1.0 비율).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceConfig {
    /// 암호화폐 목표 비중 (기본값: 0.50)
    #[serde(default = "default_target_crypto")]
    pub target_crypto: f64,
    /// 주식 목표 비중 (기본값: 0.30)
    #[serde(default = "default_target_stock")]
    pub target_stock: f64,
    /// 현금 목표 비중 (기본값: 0.20, 암묵적 잔여분)
    #[serde(default = "default_target_cash")]
    pub target_cash: f64,
    /// 암호화폐 과대 비중 기준 (기본값: 0.55)
    #[serde(default = "default_crypto_overweight")]
    pub crypto_overweight: f64,
    /// 주식 과대 비중 기준 (기본값: 0.35)
    #[serde(default = "default_stock_overweight")]
    pub stock_overweight: f64,
}

fn default_target_crypto() -> f64 {
    0.50
}

fn default_target_stock() -> f64 {
    0.30
}

fn default_target_cash() -> f64 {
    0.20
}

fn default_crypto_overweight() -> f64 {
    0.55
}

fn default_stock_overweight() -> f64 {
    0.35
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            target_crypto: default_target_crypto(),
            target_stock: default_target_stock(),
            target_cash: default_target_cash(),
            crypto_overweight: default_crypto_overweight(),
            stock_overweight: default_stock_overweight(),
        }
    }
}

/// 현재 배분 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    /// 포트폴리오 총 가치
    pub total_value: Decimal,
    /// 암호화폐 시장 가치 합
    pub crypto_value: Decimal,
    /// 주식 시장 가치 합
    pub stock_value: Decimal,
    /// 암호화폐 비중 (0.0 ~ 1.0)
    pub crypto_alloc: f64,
    /// 주식 비중 (0.0 ~ 1.0)
    pub stock_alloc: f64,
}

impl Allocation {
    /// 잔여 현금 비중.
    pub fn cash_alloc(&self) -> f64 {
        (1.0 - self.crypto_alloc - self.stock_alloc).max(0.0)
    }
}

/// 리밸런싱 권고.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebalanceAdvice {
    /// 현재 배분
    pub allocation: Allocation,
    /// 과대 비중 자산 클래스 (비어 있으면 균형)
    pub overweight: Vec<AssetClass>,
}

impl RebalanceAdvice {
    /// 균형 상태 여부.
    pub fn is_balanced(&self) -> bool {
        self.overweight.is_empty()
    }
}

/// 리밸런서.
#[derive(Debug, Clone, Default)]
pub struct Rebalancer {
    config: RebalanceConfig,
}

impl Rebalancer {
    /// 새 리밸런서 생성.
    pub fn new(config: RebalanceConfig) -> Self {
        Self { config }
    }

    /// 설정 참조.
    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// 배분을 평가합니다.
    ///
    /// 포트폴리오 총 가치가 0 이하면 `None` (아무것도 하지 않음).
    pub fn evaluate(&self, positions: &[Position], total_value: Decimal) -> Option<RebalanceAdvice> {
        if total_value <= Decimal::ZERO {
            return None;
        }

        let (crypto_value, stock_value) =
            positions
                .iter()
                .fold((Decimal::ZERO, Decimal::ZERO), |(crypto, stock), p| {
                    match p.asset_class() {
                        AssetClass::Crypto => (crypto + p.market_value, stock),
                        AssetClass::Stock => (crypto, stock + p.market_value),
                    }
                });

        let allocation = Allocation {
            total_value,
            crypto_value,
            stock_value,
            crypto_alloc: ratio_pct(crypto_value, total_value) / 100.0,
            stock_alloc: ratio_pct(stock_value, total_value) / 100.0,
        };

        let mut overweight = Vec::new();
        if allocation.crypto_alloc > self.config.crypto_overweight {
            overweight.push(AssetClass::Crypto);
        }
        if allocation.stock_alloc > self.config.stock_overweight {
            overweight.push(AssetClass::Stock);
        }

        Some(RebalanceAdvice {
            allocation,
            overweight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(symbol: &str, value: Decimal) -> Position {
        Position::long(symbol, Decimal::ONE, value, value)
    }

    #[test]
    fn test_noop_when_total_zero() {
        let rebalancer = Rebalancer::default();
        let positions = vec![position("BTC/USD", dec!(100))];
        assert!(rebalancer.evaluate(&positions, Decimal::ZERO).is_none());
    }

    #[test]
    fn test_balanced_portfolio() {
        let rebalancer = Rebalancer::default();
        let positions = vec![position("BTC/USD", dec!(5000)), position("AAPL", dec!(3000))];

        let advice = rebalancer.evaluate(&positions, dec!(10000)).unwrap();
        assert!(advice.is_balanced());
        assert!((advice.allocation.crypto_alloc - 0.5).abs() < 1e-9);
        assert!((advice.allocation.stock_alloc - 0.3).abs() < 1e-9);
        assert!((advice.allocation.cash_alloc() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_crypto_overweight() {
        let rebalancer = Rebalancer::default();
        let positions = vec![position("ETHUSD", dec!(6000)), position("AAPL", dec!(1000))];

        let advice = rebalancer.evaluate(&positions, dec!(10000)).unwrap();
        assert_eq!(advice.overweight, vec![AssetClass::Crypto]);
    }

    #[test]
    fn test_both_overweight() {
        let rebalancer = Rebalancer::new(RebalanceConfig {
            crypto_overweight: 0.4,
            stock_overweight: 0.3,
            ..Default::default()
        });
        let positions = vec![position("BTC/USD", dec!(5000)), position("TSLA", dec!(4000))];

        let advice = rebalancer.evaluate(&positions, dec!(10000)).unwrap();
        assert_eq!(advice.overweight, vec![AssetClass::Crypto, AssetClass::Stock]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let rebalancer = Rebalancer::default();
        let positions = vec![position("BTC/USD", dec!(5500))];

        let advice = rebalancer.evaluate(&positions, dec!(10000)).unwrap();
        assert!(advice.is_balanced());
    }
}
