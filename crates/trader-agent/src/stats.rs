//! 사이클 결과 구조체.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use trader_core::TradeSignal;
use trader_execution::{ExecutionResult, TradeStatus};
use trader_risk::{ExitReason, ExitSignal, RebalanceAdvice};

/// 자산별 처리 결과
#[derive(Debug, Clone, Serialize)]
pub struct AssetOutcome {
    /// 심볼
    pub symbol: String,
    /// 결정된 시그널
    pub signal: TradeSignal,
    /// 처리 상태
    pub status: TradeStatus,
    /// 상세 메시지
    pub message: String,
}

impl AssetOutcome {
    /// 실행 결과로부터 생성
    pub fn from_execution(symbol: &str, signal: TradeSignal, result: &ExecutionResult) -> Self {
        Self {
            symbol: symbol.to_string(),
            signal,
            status: result.status(),
            message: result.message(),
        }
    }

    /// 시그널 조회 실패
    pub fn signal_error(symbol: &str, message: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            signal: TradeSignal::Hold,
            status: TradeStatus::Error,
            message: message.into(),
        }
    }
}

/// 손절/익절 청산 결과
#[derive(Debug, Clone, Serialize)]
pub struct ExitOutcome {
    /// 심볼
    pub symbol: String,
    /// 청산 사유
    pub reason: ExitReason,
    /// 판정 시점 손익률 (%)
    pub pnl_pct: Decimal,
    /// 실현 손익 (청산 성공 시)
    pub pnl: Option<Decimal>,
    /// 실패 사유
    pub error: Option<String>,
}

impl ExitOutcome {
    /// 청산 성공
    pub fn closed(signal: &ExitSignal, pnl: Decimal) -> Self {
        Self {
            symbol: signal.symbol.clone(),
            reason: signal.reason,
            pnl_pct: signal.pnl_pct,
            pnl: Some(pnl),
            error: None,
        }
    }

    /// 청산 실패
    pub fn failed(signal: &ExitSignal, error: impl Into<String>) -> Self {
        Self {
            symbol: signal.symbol.clone(),
            reason: signal.reason,
            pnl_pct: signal.pnl_pct,
            pnl: None,
            error: Some(error.into()),
        }
    }

    /// 청산 성공 여부
    pub fn is_closed(&self) -> bool {
        self.pnl.is_some()
    }
}

/// 한 사이클의 관측 결과 (저장하지 않음)
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// 사이클 번호
    pub cycle: u64,
    /// 시작 시각
    pub started_at: DateTime<Utc>,
    /// 리스크 모니터 청산
    pub exits: Vec<ExitOutcome>,
    /// 자산 배분 권고
    pub rebalance: Option<RebalanceAdvice>,
    /// 일일 게이트 개방 여부
    pub gate_open: bool,
    /// 게이트 사유
    pub gate_reason: String,
    /// 자산별 결과
    pub assets: Vec<AssetOutcome>,
    /// 중지 요청으로 자산 처리가 중단되었는지
    pub cancelled: bool,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CycleReport {
    /// 새 보고서 생성
    pub fn new(cycle: u64) -> Self {
        Self {
            cycle,
            started_at: Utc::now(),
            exits: Vec::new(),
            rebalance: None,
            gate_open: false,
            gate_reason: String::new(),
            assets: Vec::new(),
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    /// 상태별 자산 수
    pub fn count(&self, status: TradeStatus) -> usize {
        self.assets.iter().filter(|a| a.status == status).count()
    }

    /// 성공한 청산 수
    pub fn closed_count(&self) -> usize {
        self.exits.iter().filter(|e| e.is_closed()).count()
    }

    /// 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            cycle = self.cycle,
            closed = self.closed_count(),
            gate_open = self.gate_open,
            executed = self.count(TradeStatus::Success),
            skipped = self.count(TradeStatus::Skipped),
            rejected = self.count(TradeStatus::Rejected),
            errors = self.count(TradeStatus::Error),
            cancelled = self.cancelled,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "사이클 완료"
        );
    }
}
