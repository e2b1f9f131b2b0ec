//! 리스크 관리 설정.
//!
//! 일일 손실 한도, 포지션 사이징, 손절/익절 기준을 위한
//! 설정 구조체를 정의합니다.
//!
//! 잘못된 값은 기동을 중단시키지 않고 경고 후 기본값으로 대체됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{decimal_from_f64, lenient_f64, DecimalExt};

/// 리스크 관리 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// 초기 자본 (기본값: 10000)
    /// 일일 기준 자본이 관측되기 전까지 현재 자본으로 사용됩니다
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,

    /// 일일 시작 자본 대비 최대 손실 비율 (기본값: 2%)
    /// 이 한도에 도달하면 신규 거래가 중지됩니다
    #[serde(default = "default_max_daily_loss_pct")]
    pub max_daily_loss_pct: f64,

    /// 현재 자본 대비 최대 포지션 크기 비율 (기본값: 5%)
    #[serde(default = "default_max_position_size_pct")]
    pub max_position_size_pct: f64,

    /// 진입가 대비 손절 비율 (기본값: 3%)
    #[serde(default = "default_max_stop_loss_pct")]
    pub max_stop_loss_pct: f64,

    /// 진입가 대비 익절 비율 (기본값: 10%)
    /// 손절 비율과 독립적으로 설정됩니다
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,

    /// Kelly 공식의 보상:위험 비율 (기본값: 1.5)
    #[serde(default = "default_kelly_payoff_ratio")]
    pub kelly_payoff_ratio: f64,

    /// Kelly 비율 상한 (기본값: 0.25, 쿼터 Kelly)
    #[serde(default = "default_kelly_cap")]
    pub kelly_cap: f64,

    /// 가격 정밀도 (소수점 자릿수, 기본값: 2)
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u32,

    /// 소수점 수량 자산의 수량 정밀도 (기본값: 4)
    #[serde(default = "default_fractional_decimals")]
    pub fractional_decimals: u32,
}

// 기본값 함수들
fn default_initial_capital() -> Decimal {
    Decimal::from(10_000)
}

fn default_max_daily_loss_pct() -> f64 {
    2.0
}

fn default_max_position_size_pct() -> f64 {
    5.0
}

fn default_max_stop_loss_pct() -> f64 {
    3.0
}

fn default_take_profit_pct() -> f64 {
    10.0
}

fn default_kelly_payoff_ratio() -> f64 {
    1.5
}

fn default_kelly_cap() -> f64 {
    0.25
}

fn default_price_decimals() -> u32 {
    2
}

fn default_fractional_decimals() -> u32 {
    4
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            max_daily_loss_pct: default_max_daily_loss_pct(),
            max_position_size_pct: default_max_position_size_pct(),
            max_stop_loss_pct: default_max_stop_loss_pct(),
            take_profit_pct: default_take_profit_pct(),
            kelly_payoff_ratio: default_kelly_payoff_ratio(),
            kelly_cap: default_kelly_cap(),
            price_decimals: default_price_decimals(),
            fractional_decimals: default_fractional_decimals(),
        }
    }
}

/// 평면 환경 변수 이름.
pub const ENV_INITIAL_CAPITAL: &str = "INITIAL_CAPITAL";
pub const ENV_MAX_DAILY_LOSS_PCT: &str = "MAX_DAILY_LOSS_PCT";
pub const ENV_MAX_POSITION_SIZE_PCT: &str = "MAX_POSITION_SIZE_PCT";
pub const ENV_MAX_STOP_LOSS_PCT: &str = "MAX_STOP_LOSS_PCT";

impl RiskConfig {
    /// 기본값으로 새 RiskConfig를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 환경 변수에서 설정을 로드합니다.
    ///
    /// `INITIAL_CAPITAL`, `MAX_DAILY_LOSS_PCT`, `MAX_POSITION_SIZE_PCT`,
    /// `MAX_STOP_LOSS_PCT`를 읽습니다. 없거나 잘못된 값은 기본값을 사용합니다.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.sanitized()
    }

    /// 주어진 조회 함수로 평면 키 값을 덮어씁니다.
    ///
    /// 값이 없거나 비어 있으면 현재 값을 유지합니다.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, current: f64| lenient_f64(key, lookup(key).as_deref(), current);

        let current_capital = self.initial_capital.as_f64();
        let capital = read(ENV_INITIAL_CAPITAL, current_capital);
        if capital != current_capital {
            self.initial_capital = decimal_from_f64(capital);
        }
        self.max_daily_loss_pct = read(ENV_MAX_DAILY_LOSS_PCT, self.max_daily_loss_pct);
        self.max_position_size_pct = read(ENV_MAX_POSITION_SIZE_PCT, self.max_position_size_pct);
        self.max_stop_loss_pct = read(ENV_MAX_STOP_LOSS_PCT, self.max_stop_loss_pct);
    }

    /// 범위를 벗어난 값을 기본값으로 대체한 설정을 반환합니다.
    pub fn sanitized(mut self) -> Self {
        for issue in self.validate() {
            tracing::warn!(
                field = issue.field,
                reason = %issue.reason,
                "리스크 설정 값이 범위를 벗어나 기본값으로 대체합니다"
            );
            match issue.field {
                "initial_capital" => self.initial_capital = default_initial_capital(),
                "max_daily_loss_pct" => self.max_daily_loss_pct = default_max_daily_loss_pct(),
                "max_position_size_pct" => {
                    self.max_position_size_pct = default_max_position_size_pct()
                }
                "max_stop_loss_pct" => self.max_stop_loss_pct = default_max_stop_loss_pct(),
                "take_profit_pct" => self.take_profit_pct = default_take_profit_pct(),
                "kelly_payoff_ratio" => self.kelly_payoff_ratio = default_kelly_payoff_ratio(),
                "kelly_cap" => self.kelly_cap = default_kelly_cap(),
                "price_decimals" => self.price_decimals = default_price_decimals(),
                _ => {}
            }
        }
        self
    }

    /// 설정 값을 검증합니다. 문제가 없으면 빈 벡터를 반환합니다.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.initial_capital <= Decimal::ZERO {
            issues.push(ConfigIssue::new(
                "initial_capital",
                "initial_capital must be greater than 0",
            ));
        }

        if !in_pct_range(self.max_daily_loss_pct, 100.0) {
            issues.push(ConfigIssue::new(
                "max_daily_loss_pct",
                "max_daily_loss_pct must be between 0 and 100",
            ));
        }

        if !in_pct_range(self.max_position_size_pct, 100.0) {
            issues.push(ConfigIssue::new(
                "max_position_size_pct",
                "max_position_size_pct must be between 0 and 100",
            ));
        }

        if !in_pct_range(self.max_stop_loss_pct, 50.0) {
            issues.push(ConfigIssue::new(
                "max_stop_loss_pct",
                "max_stop_loss_pct must be between 0 and 50",
            ));
        }

        if !(self.take_profit_pct.is_finite() && self.take_profit_pct > 0.0) {
            issues.push(ConfigIssue::new(
                "take_profit_pct",
                "take_profit_pct must be greater than 0",
            ));
        }

        if !(self.kelly_payoff_ratio.is_finite() && self.kelly_payoff_ratio > 0.0) {
            issues.push(ConfigIssue::new(
                "kelly_payoff_ratio",
                "kelly_payoff_ratio must be greater than 0",
            ));
        }

        if !in_pct_range(self.kelly_cap, 1.0) {
            issues.push(ConfigIssue::new(
                "kelly_cap",
                "kelly_cap must be between 0 and 1",
            ));
        }

        if self.price_decimals > MAX_PRICE_DECIMALS {
            issues.push(ConfigIssue::new(
                "price_decimals",
                format!("price_decimals must be at most {}", MAX_PRICE_DECIMALS),
            ));
        }

        issues
    }
}

/// 가격 정밀도 상한 ($1 미만 호가 단위는 두 자리 더 세밀함)
const MAX_PRICE_DECIMALS: u32 = 8;

/// `(0, max]` 범위 확인.
fn in_pct_range(value: f64, max: f64) -> bool {
    value.is_finite() && value > 0.0 && value <= max
}

/// 설정 검증 문제.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid configuration value for {field}: {reason}")]
pub struct ConfigIssue {
    /// 필드 이름
    pub field: &'static str,
    /// 사유
    pub reason: String,
}

impl ConfigIssue {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RiskConfig::default();

        assert_eq!(config.initial_capital, dec!(10000));
        assert_eq!(config.max_daily_loss_pct, 2.0);
        assert_eq!(config.max_position_size_pct, 5.0);
        assert_eq!(config.max_stop_loss_pct, 3.0);
        assert_eq!(config.take_profit_pct, 10.0);
        assert_eq!(config.kelly_cap, 0.25);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_overrides_are_lenient() {
        let mut config = RiskConfig::default();
        config.apply_overrides(lookup_from(&[
            ("INITIAL_CAPITAL", "$25000"),
            ("MAX_DAILY_LOSS_PCT", " 1.5% "),
            ("MAX_POSITION_SIZE_PCT", "ten"),
            ("MAX_STOP_LOSS_PCT", ""),
        ]));

        assert_eq!(config.initial_capital, dec!(25000));
        assert_eq!(config.max_daily_loss_pct, 1.5);
        // 잘못된 값과 빈 값은 기존 값을 유지
        assert_eq!(config.max_position_size_pct, 5.0);
        assert_eq!(config.max_stop_loss_pct, 3.0);
    }

    #[test]
    fn test_sanitized_replaces_out_of_range() {
        let config = RiskConfig {
            initial_capital: dec!(-5),
            max_daily_loss_pct: 0.0,
            max_position_size_pct: 150.0,
            max_stop_loss_pct: 75.0,
            kelly_cap: 2.0,
            price_decimals: 40,
            ..Default::default()
        };

        let issues = config.validate();
        assert_eq!(issues.len(), 6);

        let clean = config.sanitized();
        assert_eq!(clean.initial_capital, dec!(10000));
        assert_eq!(clean.max_daily_loss_pct, 2.0);
        assert_eq!(clean.max_position_size_pct, 5.0);
        assert_eq!(clean.max_stop_loss_pct, 3.0);
        assert_eq!(clean.kelly_cap, 0.25);
        assert_eq!(clean.price_decimals, 2);
        assert!(clean.validate().is_empty());
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: RiskConfig = serde_json::from_str(r#"{"max_daily_loss_pct": 4.0}"#).unwrap();

        assert_eq!(config.max_daily_loss_pct, 4.0);
        assert_eq!(config.max_position_size_pct, 5.0);
        assert_eq!(config.initial_capital, dec!(10000));
    }
}
