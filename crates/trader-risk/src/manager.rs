//! 리스크 매니저 구현.
//!
//! 모든 리스크 관리 작업을 위한 통합 인터페이스 제공:
//! - 일일 손실 게이트와 날짜 변경 초기화
//! - Kelly 기반 포지션 사이징
//! - 신규 진입 검증
//! - 손절/익절 가격 계산
//! - 외부 실측 값과의 상태 동기화 및 리스크 지표
//!
//! `RiskManager`는 프로세스당 하나이며 `Arc<RwLock<_>>`로 공유됩니다.
//! 날짜는 UTC 기준입니다. `_at` 접미사 메서드는 날짜를 직접 받아 테스트에서 사용합니다.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{Position, Price, Quantity, Side};

use crate::config::RiskConfig;
use crate::limits::{GateDecision, RiskState};
use crate::position_sizing::{PositionSizer, SizingResult};
use crate::stop_loss::{ProtectiveLevels, StopLossCalculator};
use crate::validation::{TradeValidator, ValidationResult};

/// 리스크 지표 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// 현재 자본
    pub current_capital: Decimal,
    /// 일일 기준 자본
    pub daily_start_capital: Option<Decimal>,
    /// 일일 손익
    pub daily_pnl: Decimal,
    /// 일일 손실률 (%)
    pub daily_loss_pct: f64,
    /// 일일 손실 한도 (%)
    pub daily_loss_limit: f64,
    /// 포트폴리오 노출 (%)
    pub portfolio_exposure_pct: f64,
    /// 오픈 포지션 수
    pub open_positions: usize,
    /// 거래 허용 여부
    pub can_trade: bool,
}

/// 현재 UTC 날짜.
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// 리스크 매니저.
#[derive(Debug, Clone)]
pub struct RiskManager {
    /// 리스크 설정
    config: RiskConfig,
    /// 일일 상태
    state: RiskState,
    /// 포지션 크기 계산기
    sizer: PositionSizer,
    /// 진입 검증기
    validator: TradeValidator,
    /// 손절가 계산기
    stops: StopLossCalculator,
}

impl RiskManager {
    /// 설정으로 새 리스크 매니저 생성.
    pub fn new(config: RiskConfig) -> Self {
        Self::new_at(config, today())
    }

    /// 지정한 날짜로 새 리스크 매니저 생성.
    pub fn new_at(config: RiskConfig, today: NaiveDate) -> Self {
        Self {
            state: RiskState::new(&config, today),
            sizer: PositionSizer::new(&config),
            validator: TradeValidator::new(config.max_position_size_pct),
            stops: StopLossCalculator::new(&config),
            config,
        }
    }

    /// 설정 참조 조회.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// 상태 참조 조회.
    pub fn state(&self) -> &RiskState {
        &self.state
    }

    // ==================== Daily Gate ====================

    /// 날짜가 바뀌었으면 일일 추적을 초기화합니다.
    pub fn reset_if_new_day(&mut self) -> bool {
        self.reset_if_new_day_at(today())
    }

    /// 지정한 날짜 기준으로 일일 초기화.
    pub fn reset_if_new_day_at(&mut self, date: NaiveDate) -> bool {
        self.state.reset_if_new_day(date)
    }

    /// 현재 자본.
    pub fn current_capital(&self) -> Decimal {
        self.state.current_capital()
    }

    /// 일일 손실 게이트.
    pub fn can_trade(&mut self) -> GateDecision {
        self.can_trade_at(today())
    }

    /// 지정한 날짜 기준 일일 손실 게이트.
    pub fn can_trade_at(&mut self, date: NaiveDate) -> GateDecision {
        self.state.gate(date)
    }

    // ==================== Position Tracking ====================

    /// 진입 기록.
    pub fn record_open(&mut self, symbol: &str, position_value: Decimal) {
        self.state.record_open(symbol, position_value);
    }

    /// 청산 기록.
    pub fn record_close(&mut self, symbol: &str, pnl: Decimal) {
        self.state.record_close(symbol, pnl);
    }

    /// 현재 자본 대비 포트폴리오 노출 (%).
    pub fn portfolio_exposure_pct(&self) -> f64 {
        self.state.exposure_pct()
    }

    // ==================== Sizing / Validation ====================

    /// 현재 자본 기준 포지션 크기 계산.
    pub fn size_position(&self, symbol: &str, confidence: f64, price: Price) -> SizingResult {
        self.sizer
            .size(symbol, confidence, price, self.current_capital())
    }

    /// 신규 진입 검증.
    pub fn validate_trade(&mut self, side: Side, quantity: Quantity, price: Price) -> ValidationResult {
        self.validate_trade_at(side, quantity, price, today())
    }

    /// 지정한 날짜 기준 신규 진입 검증.
    pub fn validate_trade_at(
        &mut self,
        side: Side,
        quantity: Quantity,
        price: Price,
        date: NaiveDate,
    ) -> ValidationResult {
        let gate = self.state.gate(date);
        self.validator
            .validate(gate, side, quantity * price, self.current_capital())
    }

    /// 손절가 계산.
    pub fn stop_loss_price(&self, entry_price: Price, side: Side) -> Price {
        self.stops.stop_price(entry_price, side)
    }

    /// 손절가와 이익실현가 계산.
    pub fn protective_levels(&self, entry_price: Price, side: Side) -> ProtectiveLevels {
        self.stops.protective_levels(entry_price, side)
    }

    // ==================== Metrics ====================

    /// 리스크 지표 스냅샷.
    ///
    /// 라이브 포지션이나 자산이 주어지면 먼저 상태를 실측 값에 맞춥니다.
    pub fn risk_metrics(
        &mut self,
        live_positions: Option<&[Position]>,
        equity: Option<Decimal>,
    ) -> RiskMetrics {
        self.risk_metrics_at(live_positions, equity, today())
    }

    /// 지정한 날짜 기준 리스크 지표 스냅샷.
    pub fn risk_metrics_at(
        &mut self,
        live_positions: Option<&[Position]>,
        equity: Option<Decimal>,
        date: NaiveDate,
    ) -> RiskMetrics {
        self.state.reconcile(live_positions, equity, date);
        let gate = self.state.gate(date);

        RiskMetrics {
            current_capital: self.state.current_capital(),
            daily_start_capital: self.state.daily_start_capital(),
            daily_pnl: self.state.daily_pnl(),
            daily_loss_pct: self.state.daily_loss_pct(),
            daily_loss_limit: self.state.max_daily_loss_pct(),
            portfolio_exposure_pct: self.state.exposure_pct(),
            open_positions: self.state.open_positions().len(),
            can_trade: gate.is_open(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn manager() -> RiskManager {
        RiskManager::new_at(RiskConfig::default(), day(4))
    }

    #[test]
    fn test_sizing_scenario() {
        let manager = manager();
        let result = manager.size_position("AAPL", 0.85, dec!(100));

        assert_eq!(result.shares(), dec!(5));
        assert_eq!(result.position_value(), dec!(500));
    }

    #[test]
    fn test_daily_loss_scenario() {
        let mut manager = manager();
        assert!(manager.can_trade_at(day(4)).is_open());

        manager.record_close("AAPL", dec!(-250));
        let gate = manager.can_trade_at(day(4));
        assert!(!gate.is_open());
        assert!(gate.reason().starts_with("Daily loss limit reached: 2.50%"));
    }

    #[test]
    fn test_validate_trade_flow() {
        let mut manager = manager();

        let accepted = manager.validate_trade_at(Side::Buy, dec!(5), dec!(100), day(4));
        assert!(accepted.is_accepted());

        let too_big = manager.validate_trade_at(Side::Buy, dec!(6), dec!(100), day(4));
        assert_eq!(too_big.code(), "position_size_exceeded");

        manager.record_close("AAPL", dec!(-500));
        let halted = manager.validate_trade_at(Side::Buy, dec!(1), dec!(100), day(4));
        assert_eq!(halted.code(), "daily_loss_limit");
    }

    #[test]
    fn test_loss_shrinks_capital_for_sizing() {
        let mut manager = manager();
        manager.can_trade_at(day(4));
        manager.record_close("AAPL", dec!(-100));

        // 9900 * 5% = 495 → 4주
        let result = manager.size_position("AAPL", 0.85, dec!(100));
        assert_eq!(result.shares(), dec!(4));
    }

    #[test]
    fn test_stop_loss_price() {
        let manager = manager();
        assert_eq!(manager.stop_loss_price(dec!(100), Side::Buy), dec!(97));
        assert_eq!(manager.stop_loss_price(dec!(100), Side::Sell), dec!(103));
    }

    #[test]
    fn test_metrics_establish_baseline() {
        let mut manager = manager();
        let metrics = manager.risk_metrics_at(None, None, day(4));

        assert_eq!(metrics.current_capital, dec!(10000));
        assert_eq!(metrics.daily_start_capital, Some(dec!(10000)));
        assert_eq!(metrics.daily_loss_pct, 0.0);
        assert_eq!(metrics.daily_loss_limit, 2.0);
        assert_eq!(metrics.open_positions, 0);
        assert!(metrics.can_trade);
    }

    #[test]
    fn test_metrics_reconcile_with_live_data() {
        let mut manager = manager();
        manager.record_open("STALE", dec!(100));

        let live = vec![Position::long("AAPL", dec!(10), dec!(100), dec!(100))];
        let metrics = manager.risk_metrics_at(Some(&live), Some(dec!(20000)), day(4));

        assert_eq!(metrics.daily_start_capital, Some(dec!(20000)));
        assert_eq!(metrics.current_capital, dec!(20000));
        assert_eq!(metrics.open_positions, 1);
        assert_eq!(metrics.portfolio_exposure_pct, 5.0);

        // 자산 하락 → 일일 손실
        let metrics = manager.risk_metrics_at(None, Some(dec!(19500)), day(4));
        assert_eq!(metrics.daily_pnl, dec!(-500));
        assert_eq!(metrics.daily_loss_pct, 2.5);
        assert!(!metrics.can_trade);
    }

    #[test]
    fn test_metrics_new_day_rolls_baseline() {
        let mut manager = manager();
        manager.risk_metrics_at(None, Some(dec!(10000)), day(4));
        manager.risk_metrics_at(None, Some(dec!(9700)), day(4));

        // 다음 날: 전날 종료 자본이 기준
        let metrics = manager.risk_metrics_at(None, Some(dec!(9750)), day(5));
        assert_eq!(metrics.daily_start_capital, Some(dec!(9700)));
        assert_eq!(metrics.daily_pnl, dec!(50));
        assert!(metrics.can_trade);
    }
}
