//! 거래 executor 구현.
//!
//! 제공 기능:
//! - 시그널을 리스크 검사를 거친 시장가 주문으로 변환 및 제출
//! - 손절가 (주식은 익절가 포함 브라켓) 자동 설정
//! - 포지션 청산 및 손익 기록
//! - 긴급 전체 청산
//!
//! 모든 외부 호출은 시간 제한으로 감싸집니다.
//! 리스크 매니저 락은 외부 호출 동안 잡지 않습니다.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn, Instrument};
use trader_core::{
    call_with_timeout, trading_span, AccountSnapshot, AssetClass, ClosedPosition, ExecutionGateway,
    OrderRequest, PortfolioStore, Position, Price, TradeRecord, TradeSignal, TraderError,
    TraderResult,
};
use trader_risk::{ProtectiveLevels, RejectReason, RiskManager, SizingResult, ValidationResult};

/// 실행 결과 상태 (닫힌 집합).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Success,
    Skipped,
    Rejected,
    Error,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeStatus::Success => "success",
            TradeStatus::Skipped => "skipped",
            TradeStatus::Rejected => "rejected",
            TradeStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// 단일 거래 실행 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum ExecutionResult {
    /// 주문 제출 성공
    Success(TradeRecord),
    /// 건너뜀 (에러 아님)
    Skipped(String),
    /// 리스크 규칙으로 거부됨 (재시도하지 않음)
    Rejected(RejectReason),
    /// 시세 조회 또는 주문 제출 실패
    Error(String),
}

impl ExecutionResult {
    /// 상태.
    pub fn status(&self) -> TradeStatus {
        match self {
            ExecutionResult::Success(_) => TradeStatus::Success,
            ExecutionResult::Skipped(_) => TradeStatus::Skipped,
            ExecutionResult::Rejected(_) => TradeStatus::Rejected,
            ExecutionResult::Error(_) => TradeStatus::Error,
        }
    }

    /// 성공 여부.
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    /// 체결 기록 (성공 시).
    pub fn trade(&self) -> Option<&TradeRecord> {
        match self {
            ExecutionResult::Success(record) => Some(record),
            _ => None,
        }
    }

    /// 사람이 읽을 수 있는 메시지.
    pub fn message(&self) -> String {
        match self {
            ExecutionResult::Success(record) => format!(
                "{} {} {} @ {}",
                record.side, record.quantity, record.symbol, record.entry_price
            ),
            ExecutionResult::Skipped(msg) | ExecutionResult::Error(msg) => msg.clone(),
            ExecutionResult::Rejected(reason) => reason.to_string(),
        }
    }
}

/// 개별 청산 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CloseOutcome {
    /// 청산 성공
    Closed(ClosedPosition),
    /// 청산 실패
    Failed { symbol: String, error: String },
}

/// 전체 청산 보고서.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CloseAllReport {
    /// 청산된 포지션 수
    pub closed: usize,
    /// 실패한 포지션 수
    pub failed: usize,
    /// 상세 결과
    pub details: Vec<CloseOutcome>,
}

impl CloseAllReport {
    /// 실현 손익 합계.
    pub fn total_pnl(&self) -> Decimal {
        self.details
            .iter()
            .filter_map(|d| match d {
                CloseOutcome::Closed(c) => Some(c.pnl),
                CloseOutcome::Failed { .. } => None,
            })
            .sum()
    }
}

/// 거래 executor.
///
/// 다음을 통합하는 핵심 컴포넌트:
/// - RiskManager: 사이징, 검증, 손절가, 진입/청산 기록
/// - ExecutionGateway: 시세 조회, 주문 제출, 청산
/// - PortfolioStore: 체결/청산 기록 전달 (선택)
#[derive(Clone)]
pub struct TradeExecutor {
    /// 실행 거래소
    gateway: Arc<dyn ExecutionGateway>,
    /// 리스크 관리자
    risk_manager: Arc<RwLock<RiskManager>>,
    /// 체결 기록 저장소
    store: Option<Arc<dyn PortfolioStore>>,
    /// 외부 호출 시간 제한
    call_timeout: Duration,
}

impl TradeExecutor {
    /// 새 executor 생성.
    pub fn new(
        gateway: Arc<dyn ExecutionGateway>,
        risk_manager: Arc<RwLock<RiskManager>>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            risk_manager,
            store: None,
            call_timeout,
        }
    }

    /// 체결 기록 저장소를 설정합니다.
    pub fn with_store(mut self, store: Arc<dyn PortfolioStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 리스크 관리자 참조.
    pub fn risk_manager(&self) -> &Arc<RwLock<RiskManager>> {
        &self.risk_manager
    }

    /// 실행 거래소 참조.
    pub fn gateway(&self) -> &Arc<dyn ExecutionGateway> {
        &self.gateway
    }

    /// 외부 호출 시간 제한.
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// 현재가 조회. 시세가 없거나 호출이 실패하면 `QuoteUnavailable`.
    pub async fn current_price(&self, symbol: &str) -> TraderResult<Price> {
        let result = call_with_timeout(
            self.call_timeout,
            "current_price",
            self.gateway.current_price(symbol),
        )
        .await;

        match result {
            Ok(Some(price)) if price > Decimal::ZERO => Ok(price),
            Ok(_) => Err(TraderError::QuoteUnavailable(symbol.to_string())),
            Err(e) => {
                debug!(symbol = symbol, error = %e, "시세 조회 실패");
                Err(TraderError::QuoteUnavailable(format!("{}: {}", symbol, e)))
            }
        }
    }

    /// 오픈 포지션 조회.
    pub async fn positions(&self) -> TraderResult<Vec<Position>> {
        let positions =
            call_with_timeout(self.call_timeout, "positions", self.gateway.positions()).await?;
        Ok(positions)
    }

    /// 계좌 조회.
    pub async fn account(&self) -> TraderResult<AccountSnapshot> {
        let account =
            call_with_timeout(self.call_timeout, "account", self.gateway.account()).await?;
        Ok(account)
    }

    /// 시그널에 따라 단일 거래를 실행합니다.
    ///
    /// 순서: Hold 확인 → 시세 조회 → 사이징 → 검증 → 손절가 → 주문 제출 → 기록.
    pub async fn execute_trade(
        &self,
        symbol: &str,
        signal: TradeSignal,
        confidence: f64,
        reason: &str,
    ) -> ExecutionResult {
        let Some(side) = signal.side() else {
            return ExecutionResult::Skipped("Hold signal - no action taken".to_string());
        };

        let price = match self.current_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                warn!(symbol = symbol, error = %e, "시세 조회 불가, 자산 건너뜀");
                return ExecutionResult::Error(format!("Could not fetch price for {}", symbol));
            }
        };

        // 사이징과 검증은 하나의 쓰기 락 안에서 수행
        let (shares, position_value, levels, order) = {
            let mut rm = self.risk_manager.write().await;

            let (shares, position_value) =
                match rm.size_position(symbol, confidence, price) {
                    SizingResult::Sized {
                        shares,
                        position_value,
                    } => (shares, position_value),
                    SizingResult::Zero => {
                        info!(symbol = symbol, price = %price, "포지션 크기 0, 건너뜀");
                        return ExecutionResult::Skipped("Position size too small".to_string());
                    }
                };

            if let ValidationResult::Rejected(reject) = rm.validate_trade(side, shares, price) {
                warn!(
                    symbol = symbol,
                    code = reject.code(),
                    reason = %reject,
                    "거래 거부"
                );
                return ExecutionResult::Rejected(reject);
            }

            let levels = rm.protective_levels(price, side);
            let mut order =
                OrderRequest::market(symbol, side, shares).with_stop_loss(levels.stop_loss);
            // 주식은 브라켓 주문 (손절 + 익절)
            if AssetClass::classify(symbol) == AssetClass::Stock {
                order = order.with_take_profit(levels.take_profit);
            }

            (shares, position_value, levels, order)
        };

        let receipt = match call_with_timeout(
            self.call_timeout,
            "submit_order",
            self.gateway.submit_order(&order),
        )
        .instrument(trading_span!("submit_order", symbol, side))
        .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(symbol = symbol, side = %side, error = %e, "주문 실패");
                return ExecutionResult::Error(format!("Order failed: {}", e));
            }
        };

        self.risk_manager
            .write()
            .await
            .record_open(symbol, position_value);

        let stop_loss = order.stop_loss.unwrap_or(price);
        let record = TradeRecord {
            order_id: receipt.order_id,
            symbol: symbol.to_string(),
            side,
            quantity: shares,
            entry_price: price,
            stop_loss,
            position_value,
            confidence,
            reason: reason.to_string(),
            opened_at: Utc::now(),
        };

        info!(
            symbol = symbol,
            side = %side,
            qty = %shares,
            price = %price,
            stop_loss = %stop_loss,
            risk_reward = %risk_reward_label(&levels, price),
            reason = reason,
            "거래 실행"
        );

        if let Some(store) = &self.store {
            let logged = call_with_timeout(
                self.call_timeout,
                "log_open",
                store.log_open(record.clone()),
            )
            .await;
            if let Err(e) = logged {
                warn!(symbol = symbol, error = %e, "체결 기록 실패");
            }
        }

        ExecutionResult::Success(record)
    }

    /// 포지션을 청산하고 손익을 기록합니다.
    pub async fn close_position(&self, symbol: &str) -> TraderResult<ClosedPosition> {
        let closed = call_with_timeout(
            self.call_timeout,
            "close_position",
            self.gateway.close_position(symbol),
        )
        .await
        .map_err(|e| TraderError::Execution(format!("Failed to close position: {}", e)))?;

        self.risk_manager
            .write()
            .await
            .record_close(symbol, closed.pnl);

        if let Some(store) = &self.store {
            let logged = call_with_timeout(
                self.call_timeout,
                "log_close",
                store.log_close(symbol, closed.exit_price, closed.pnl),
            )
            .await;
            if let Err(e) = logged {
                warn!(symbol = symbol, error = %e, "청산 기록 실패");
            }
        }

        info!(
            symbol = symbol,
            exit_price = %closed.exit_price,
            pnl = %closed.pnl,
            "포지션 청산"
        );

        Ok(closed)
    }

    /// 모든 오픈 포지션을 청산합니다 (긴급).
    ///
    /// 개별 청산 실패는 보고서에 기록되고 나머지 청산은 계속됩니다.
    pub async fn close_all_positions(&self) -> TraderResult<CloseAllReport> {
        let positions = self.positions().await?;
        let mut report = CloseAllReport::default();

        for position in positions {
            match self.close_position(&position.symbol).await {
                Ok(closed) => {
                    report.closed += 1;
                    report.details.push(CloseOutcome::Closed(closed));
                }
                Err(e) => {
                    error!(symbol = %position.symbol, error = %e, "청산 실패");
                    report.failed += 1;
                    report.details.push(CloseOutcome::Failed {
                        symbol: position.symbol.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        warn!(
            closed = report.closed,
            failed = report.failed,
            total_pnl = %report.total_pnl(),
            "전체 청산 완료"
        );

        Ok(report)
    }
}

/// 로그용 위험 대비 보상 비율 (소수점 둘째 자리).
fn risk_reward_label(levels: &ProtectiveLevels, entry_price: Price) -> String {
    levels
        .risk_reward_ratio(entry_price)
        .map(|ratio| ratio.round_dp(2).to_string())
        .unwrap_or_else(|| "n/a".to_string())
}
