//! 일일 손실 한도 및 리스크 상태 추적.
//!
//! 제공 기능:
//! - 일일 기준 자본과 일일 손익 추적
//! - 날짜 변경 시 자동 일일 초기화 (UTC 기준)
//! - 일일 손실 게이트 (Open / Halted)
//! - 심볼별 투입 금액 추적
//!
//! 일일 기준 자본은 처음 관측될 때 설정되며, 같은 날 안에서는 다시 바뀌지 않습니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trader_core::{ratio_pct, Position};

use crate::config::RiskConfig;
use crate::validation::RejectReason;

/// 일일 손실 게이트 판정.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateDecision {
    /// 거래 허용
    Open,
    /// 일일 손실 한도 도달로 거래 중지
    Halted {
        /// 현재 일일 손실률 (%)
        loss_pct: f64,
        /// 허용 최대 손실률 (%)
        max_pct: f64,
    },
}

impl GateDecision {
    /// 거래 허용 여부.
    pub fn is_open(&self) -> bool {
        matches!(self, GateDecision::Open)
    }

    /// 거부 사유. 게이트가 열려 있으면 `None`.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match *self {
            GateDecision::Open => None,
            GateDecision::Halted { loss_pct, max_pct } => {
                Some(RejectReason::DailyLossLimit { loss_pct, max_pct })
            }
        }
    }

    /// 사람이 읽을 수 있는 사유.
    pub fn reason(&self) -> String {
        match self.reject_reason() {
            None => "Trading allowed".to_string(),
            Some(reason) => reason.to_string(),
        }
    }
}

/// 리스크 상태.
///
/// 프로세스 시작 시 한 번 생성되어 프로세스 수명 동안 유지됩니다.
/// 모든 변경은 `RiskManager`를 통해 하나의 락 아래에서 이루어집니다.
#[derive(Debug, Clone, Serialize)]
pub struct RiskState {
    /// 초기 자본
    initial_capital: Decimal,
    /// 일일 최대 손실률 (%)
    max_daily_loss_pct: f64,
    /// 일일 기준 자본 (처음 관측되기 전까지 없음)
    daily_start_capital: Option<Decimal>,
    /// 일일 손익
    daily_pnl: Decimal,
    /// 마지막 초기화 날짜
    last_reset_date: NaiveDate,
    /// 심볼별 투입 금액 (항상 0 이상)
    open_positions: HashMap<String, Decimal>,
}

impl RiskState {
    /// 새 리스크 상태 생성.
    pub fn new(config: &RiskConfig, today: NaiveDate) -> Self {
        Self {
            initial_capital: config.initial_capital,
            max_daily_loss_pct: config.max_daily_loss_pct,
            daily_start_capital: None,
            daily_pnl: Decimal::ZERO,
            last_reset_date: today,
            open_positions: HashMap::new(),
        }
    }

    /// 날짜가 바뀌었으면 일일 추적을 초기화합니다.
    ///
    /// 같은 날 안에서는 여러 번 호출해도 아무 일도 하지 않습니다.
    /// 초기화가 일어나면 `true`를 반환합니다.
    pub fn reset_if_new_day(&mut self, today: NaiveDate) -> bool {
        if today <= self.last_reset_date {
            return false;
        }

        let start = self.current_capital();
        self.daily_start_capital = Some(start);
        self.daily_pnl = Decimal::ZERO;
        self.last_reset_date = today;

        tracing::info!(
            date = %today,
            starting_capital = %start,
            "일일 한도 초기화"
        );
        true
    }

    /// 기준 자본이 없으면 주어진 값으로 설정합니다.
    pub fn ensure_baseline(&mut self, capital: Decimal) {
        if self.daily_start_capital.is_none() {
            tracing::debug!(starting_capital = %capital, "일일 기준 자본 설정");
            self.daily_start_capital = Some(capital);
        }
    }

    /// 현재 자본 (기준 자본 + 일일 손익, 기준이 없으면 초기 자본).
    pub fn current_capital(&self) -> Decimal {
        match self.daily_start_capital {
            Some(start) => start + self.daily_pnl,
            None => self.initial_capital,
        }
    }

    /// 기준 자본 대비 일일 손실률 (%). 기준이 없거나 0 이하면 0.
    pub fn daily_loss_pct(&self) -> f64 {
        match self.daily_start_capital {
            Some(start) => ratio_pct(start - self.current_capital(), start),
            None => 0.0,
        }
    }

    /// 일일 손실 게이트.
    ///
    /// 날짜 변경을 먼저 반영하고, 기준 자본이 없으면 현재 자본으로 설정한 뒤 판정합니다.
    pub fn gate(&mut self, today: NaiveDate) -> GateDecision {
        self.reset_if_new_day(today);
        self.ensure_baseline(self.current_capital());

        let loss_pct = self.daily_loss_pct();
        if loss_pct >= self.max_daily_loss_pct {
            GateDecision::Halted {
                loss_pct,
                max_pct: self.max_daily_loss_pct,
            }
        } else {
            GateDecision::Open
        }
    }

    /// 진입 기록 (같은 심볼은 덮어씀).
    pub fn record_open(&mut self, symbol: &str, position_value: Decimal) {
        self.open_positions
            .insert(symbol.to_string(), position_value.max(Decimal::ZERO));
    }

    /// 청산 기록: 심볼을 제거하고 손익을 일일 손익에 더합니다.
    pub fn record_close(&mut self, symbol: &str, pnl: Decimal) {
        self.open_positions.remove(symbol);
        self.daily_pnl += pnl;

        tracing::info!(
            symbol = symbol,
            pnl = %pnl,
            daily_pnl = %self.daily_pnl,
            "포지션 청산 기록"
        );
    }

    /// 외부 실측 값으로 상태를 맞춥니다.
    ///
    /// 자산(equity)이 주어지면 기준 자본을 설정하고 일일 손익을 `equity - 기준`으로 덮어씁니다.
    /// 포지션이 주어지면 투입 금액 맵을 시장 가치로 교체합니다.
    pub fn reconcile(
        &mut self,
        live_positions: Option<&[Position]>,
        equity: Option<Decimal>,
        today: NaiveDate,
    ) {
        if let Some(equity) = equity {
            self.ensure_baseline(equity);
            self.reset_if_new_day(today);
            if let Some(start) = self.daily_start_capital {
                self.daily_pnl = equity - start;
            }
        }

        if let Some(positions) = live_positions {
            self.open_positions = positions
                .iter()
                .map(|p| (p.symbol.clone(), p.market_value.max(Decimal::ZERO)))
                .collect();
        }
    }

    /// 총 투입 금액.
    pub fn total_exposure(&self) -> Decimal {
        self.open_positions.values().copied().sum()
    }

    /// 현재 자본 대비 노출 비율 (%). 포지션이 없으면 0.
    pub fn exposure_pct(&self) -> f64 {
        if self.open_positions.is_empty() {
            return 0.0;
        }
        ratio_pct(self.total_exposure(), self.current_capital())
    }

    /// 일일 기준 자본.
    pub fn daily_start_capital(&self) -> Option<Decimal> {
        self.daily_start_capital
    }

    /// 일일 손익.
    pub fn daily_pnl(&self) -> Decimal {
        self.daily_pnl
    }

    /// 마지막 초기화 날짜.
    pub fn last_reset_date(&self) -> NaiveDate {
        self.last_reset_date
    }

    /// 일일 최대 손실률 (%).
    pub fn max_daily_loss_pct(&self) -> f64 {
        self.max_daily_loss_pct
    }

    /// 심볼별 투입 금액.
    pub fn open_positions(&self) -> &HashMap<String, Decimal> {
        &self.open_positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn state() -> RiskState {
        RiskState::new(&RiskConfig::default(), day(1))
    }

    #[test]
    fn test_capital_without_baseline() {
        let state = state();
        assert_eq!(state.current_capital(), dec!(10000));
        assert!(state.daily_start_capital().is_none());
        assert_eq!(state.daily_loss_pct(), 0.0);
    }

    #[test]
    fn test_gate_establishes_baseline() {
        let mut state = state();
        assert!(state.gate(day(1)).is_open());
        assert_eq!(state.daily_start_capital(), Some(dec!(10000)));
    }

    #[test]
    fn test_gate_halts_at_limit() {
        let mut state = state();
        state.gate(day(1));
        state.record_close("AAPL", dec!(-250));

        let decision = state.gate(day(1));
        assert!(!decision.is_open());
        assert_eq!(decision.reason(), "Daily loss limit reached: 2.50% (max: 2.0%)");
    }

    #[test]
    fn test_gate_boundary_is_inclusive() {
        let mut state = state();
        state.gate(day(1));
        state.record_close("AAPL", dec!(-200));
        // 정확히 2.0% 손실이면 중지
        assert!(!state.gate(day(1)).is_open());
    }

    #[test]
    fn test_gate_open_below_limit() {
        let mut state = state();
        state.gate(day(1));
        state.record_close("AAPL", dec!(-199));
        let decision = state.gate(day(1));
        assert!(decision.is_open());
        assert_eq!(decision.reason(), "Trading allowed");
    }

    #[test]
    fn test_reset_is_idempotent_within_day() {
        let mut state = state();
        state.gate(day(1));
        state.record_close("AAPL", dec!(-300));

        assert!(!state.reset_if_new_day(day(1)));
        assert_eq!(state.daily_start_capital(), Some(dec!(10000)));
        assert_eq!(state.daily_pnl(), dec!(-300));
    }

    #[test]
    fn test_reset_on_new_day() {
        let mut state = state();
        state.gate(day(1));
        state.record_close("AAPL", dec!(-300));
        assert!(!state.gate(day(1)).is_open());

        // 다음 날: 기준 자본은 전날 종료 자본
        assert!(state.gate(day(2)).is_open());
        assert_eq!(state.daily_start_capital(), Some(dec!(9700)));
        assert_eq!(state.daily_pnl(), Decimal::ZERO);
        assert_eq!(state.last_reset_date(), day(2));

        // 같은 날 재호출은 기준 자본을 바꾸지 않음
        state.record_close("AAPL", dec!(50));
        state.gate(day(2));
        assert_eq!(state.daily_start_capital(), Some(dec!(9700)));
    }

    #[test]
    fn test_open_and_close_tracking() {
        let mut state = state();
        state.record_open("AAPL", dec!(500));
        state.record_open("BTC/USD", dec!(250));
        state.record_open("AAPL", dec!(400));
        state.record_open("TSLA", dec!(-10));

        assert_eq!(state.open_positions().len(), 3);
        assert_eq!(state.open_positions()["AAPL"], dec!(400));
        assert_eq!(state.open_positions()["TSLA"], Decimal::ZERO);

        state.record_close("AAPL", dec!(25));
        assert!(!state.open_positions().contains_key("AAPL"));
        assert_eq!(state.daily_pnl(), dec!(25));
    }

    #[test]
    fn test_exposure_pct() {
        let mut state = state();
        assert_eq!(state.exposure_pct(), 0.0);

        state.record_open("AAPL", dec!(500));
        state.record_open("MSFT", dec!(1500));
        assert_eq!(state.exposure_pct(), 20.0);
    }

    #[test]
    fn test_reconcile_with_equity() {
        let mut state = state();
        state.reconcile(None, Some(dec!(12000)), day(1));

        assert_eq!(state.daily_start_capital(), Some(dec!(12000)));
        assert_eq!(state.daily_pnl(), Decimal::ZERO);

        state.reconcile(None, Some(dec!(11700)), day(1));
        assert_eq!(state.daily_start_capital(), Some(dec!(12000)));
        assert_eq!(state.daily_pnl(), dec!(-300));
        assert_eq!(state.current_capital(), dec!(11700));
    }

    #[test]
    fn test_reconcile_with_positions() {
        let mut state = state();
        state.record_open("OLD", dec!(999));

        let live = vec![
            Position::long("AAPL", dec!(5), dec!(100), dec!(110)),
            Position::long("BTC/USD", dec!(0.01), dec!(50000), dec!(49000)),
        ];
        state.reconcile(Some(&live), None, day(1));

        assert_eq!(state.open_positions().len(), 2);
        assert_eq!(state.open_positions()["AAPL"], dec!(550));
        assert_eq!(state.open_positions()["BTC/USD"], dec!(490));
        assert!(!state.open_positions().contains_key("OLD"));
    }
}
