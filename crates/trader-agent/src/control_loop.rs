//! 자율 트레이딩 제어 루프.
//!
//! 각 사이클은 다음 순서로 실행됩니다:
//! 1. 리스크 모니터: 손절/익절 조건의 포지션 청산
//! 2. 자산 배분 점검 (권고만, 주문 없음)
//! 3. 일일 손실 게이트 (닫혀 있으면 나머지를 건너뜀)
//! 4. 감시 종목별 시그널 → 사이징 → 검증 → 주문
//!
//! 루프는 `CancellationToken`으로 중지되며, 토큰은 사이클 사이의 대기와
//! 자산 처리 사이에서 확인됩니다. 사이클 도중의 panic은 사이클 경계에서
//! 포착되어 짧은 대기 후 루프가 계속됩니다.

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use trader_core::{call_with_timeout, trading_span, TradeSignal, TraderError, TraderResult};
use trader_risk::{RebalanceAdvice, Rebalancer, RiskMetrics, RiskMonitor};

use crate::context::AgentContext;
use crate::stats::{AssetOutcome, CycleReport, ExitOutcome};

/// 에이전트 상태 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    /// 루프 실행 여부
    pub running: bool,
    /// 실행된 사이클 수
    pub cycles: u64,
    /// 마지막 사이클 결과
    pub last_cycle: Option<CycleReport>,
    /// 리스크 지표
    pub metrics: RiskMetrics,
}

/// 실행 중인 루프 핸들
struct LoopHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

struct LoopInner {
    ctx: Arc<AgentContext>,
    monitor: RiskMonitor,
    rebalancer: Rebalancer,
    running: AtomicBool,
    cycles: AtomicU64,
    last_report: RwLock<Option<CycleReport>>,
}

/// 제어 루프.
///
/// 복제본은 같은 루프를 가리킵니다.
#[derive(Clone)]
pub struct ControlLoop {
    inner: Arc<LoopInner>,
    handle: Arc<Mutex<Option<LoopHandle>>>,
}

impl ControlLoop {
    /// 컨텍스트로 제어 루프 생성
    pub async fn new(ctx: Arc<AgentContext>) -> Self {
        let monitor = RiskMonitor::new(ctx.risk_manager().read().await.config());
        let rebalancer = Rebalancer::new(ctx.settings().rebalance.clone());

        Self {
            inner: Arc::new(LoopInner {
                ctx,
                monitor,
                rebalancer,
                running: AtomicBool::new(false),
                cycles: AtomicU64::new(0),
                last_report: RwLock::new(None),
            }),
            handle: Arc::new(Mutex::new(None)),
        }
    }

    /// 실행 컨텍스트
    pub fn context(&self) -> &Arc<AgentContext> {
        &self.inner.ctx
    }

    /// 루프를 시작합니다. 이미 실행 중이면 아무것도 하지 않고 `false`.
    pub async fn start(&self) -> bool {
        let mut handle = self.handle.lock().await;
        if self.inner.running.load(Ordering::SeqCst) {
            debug!("제어 루프가 이미 실행 중");
            return false;
        }

        // 이전 실행이 남긴 핸들 정리
        if let Some(previous) = handle.take() {
            previous.token.cancel();
            if let Err(e) = previous.task.await {
                warn!(error = %e, "이전 제어 루프 태스크 종료 실패");
            }
        }

        let token = CancellationToken::new();
        self.inner.running.store(true, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(inner.run(token.clone()));
        *handle = Some(LoopHandle { token, task });

        info!(
            interval_secs = self.inner.ctx.settings().loop_interval_secs,
            watchlist = ?self.inner.ctx.settings().watchlist,
            "제어 루프 시작"
        );
        true
    }

    /// 루프를 중지합니다. 언제 호출해도 안전하며 중복 호출은 무시됩니다.
    ///
    /// 이미 제출된 주문은 되돌리지 않고, 남은 자산 처리만 건너뜁니다.
    pub async fn stop(&self) {
        let handle = self.handle.lock().await.take();
        self.inner.running.store(false, Ordering::SeqCst);

        if let Some(handle) = handle {
            handle.token.cancel();
            if let Err(e) = handle.task.await {
                error!(error = %e, "제어 루프 태스크 종료 실패");
            }
            info!("제어 루프 중지");
        }
    }

    /// 루프 실행 여부
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// 실행된 사이클 수
    pub fn cycles(&self) -> u64 {
        self.inner.cycles.load(Ordering::SeqCst)
    }

    /// 사이클 하나를 즉시 실행합니다.
    ///
    /// 루프의 한 번 반복과 동일하며, 루프 실행 여부와 무관하게
    /// 취소되지 않는 새 토큰으로 실행됩니다.
    pub async fn run_cycle(&self) -> TraderResult<CycleReport> {
        self.inner.guarded_cycle(&CancellationToken::new()).await
    }

    /// 라이브 데이터로 맞춘 리스크 지표
    pub async fn risk_metrics(&self) -> RiskMetrics {
        self.inner.ctx.risk_metrics().await
    }

    /// 마지막 사이클 결과
    pub async fn last_report(&self) -> Option<CycleReport> {
        self.inner.last_report.read().await.clone()
    }

    /// 에이전트 상태 스냅샷
    pub async fn status(&self) -> AgentStatus {
        AgentStatus {
            running: self.is_running(),
            cycles: self.cycles(),
            last_cycle: self.last_report().await,
            metrics: self.risk_metrics().await,
        }
    }
}

impl LoopInner {
    async fn run(self: Arc<Self>, token: CancellationToken) {
        let settings = self.ctx.settings();

        while !token.is_cancelled() {
            let delay = match self.guarded_cycle(&token).await {
                Ok(_) => settings.loop_interval(),
                Err(e) => {
                    error!(error = %e, backoff_secs = settings.error_backoff_secs, "사이클 장애");
                    settings.error_backoff()
                }
            };

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("제어 루프 종료");
    }

    /// panic을 사이클 경계에서 포착하여 `LoopFault`로 변환합니다.
    async fn guarded_cycle(&self, token: &CancellationToken) -> TraderResult<CycleReport> {
        let n = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let span = info_span!("cycle", n);

        let result = AssertUnwindSafe(self.cycle(n, token).instrument(span))
            .catch_unwind()
            .await;

        match result {
            Ok(report) => {
                report.log_summary();
                *self.last_report.write().await = Some(report.clone());
                Ok(report)
            }
            Err(panic) => Err(TraderError::LoopFault(panic_message(panic.as_ref()))),
        }
    }

    async fn cycle(&self, n: u64, token: &CancellationToken) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::new(n);

        report.exits = self.monitor_pass().await;
        report.rebalance = self.rebalance_pass().await;

        let gate = self.ctx.risk_manager().write().await.can_trade();
        report.gate_open = gate.is_open();
        report.gate_reason = gate.reason();
        if !gate.is_open() {
            warn!(reason = %report.gate_reason, "거래 건너뜀");
            report.elapsed = started.elapsed();
            return report;
        }

        for symbol in &self.ctx.settings().watchlist {
            if token.is_cancelled() {
                info!("중지 요청, 남은 자산 처리 건너뜀");
                report.cancelled = true;
                break;
            }

            let outcome = self
                .evaluate_asset(symbol)
                .instrument(trading_span!("asset", symbol))
                .await;
            report.assets.push(outcome);
        }

        report.elapsed = started.elapsed();
        report
    }

    /// 손절/익절 조건의 포지션을 청산합니다.
    async fn monitor_pass(&self) -> Vec<ExitOutcome> {
        let executor = self.ctx.executor();
        let positions = match executor.positions().await {
            Ok(positions) => positions,
            Err(e) => {
                warn!(error = %e, "리스크 모니터: 포지션 조회 실패");
                return Vec::new();
            }
        };

        let mut exits = Vec::new();
        for signal in self.monitor.scan(&positions) {
            warn!(
                symbol = %signal.symbol,
                reason = %signal.reason,
                pnl_pct = %signal.pnl_pct.round_dp(2),
                "청산 조건 도달"
            );

            match executor.close_position(&signal.symbol).await {
                Ok(closed) => exits.push(ExitOutcome::closed(&signal, closed.pnl)),
                Err(e) => {
                    error!(symbol = %signal.symbol, error = %e, "리스크 모니터: 청산 실패");
                    exits.push(ExitOutcome::failed(&signal, e.to_string()));
                }
            }
        }

        exits
    }

    /// 자산 배분을 점검하고 과대 비중을 알립니다.
    async fn rebalance_pass(&self) -> Option<RebalanceAdvice> {
        let executor = self.ctx.executor();
        let positions = executor
            .positions()
            .await
            .map_err(|e| warn!(error = %e, "배분 점검: 포지션 조회 실패"))
            .ok()?;
        let account = executor
            .account()
            .await
            .map_err(|e| warn!(error = %e, "배분 점검: 계좌 조회 실패"))
            .ok()?;

        let advice = self
            .rebalancer
            .evaluate(&positions, account.portfolio_value)?;

        let alloc = &advice.allocation;
        debug!(
            crypto = format!("{:.1}%", alloc.crypto_alloc * 100.0),
            stock = format!("{:.1}%", alloc.stock_alloc * 100.0),
            "현재 배분"
        );
        for class in &advice.overweight {
            warn!(asset_class = %class, "과대 비중, 노출 축소 권고");
        }

        Some(advice)
    }

    /// 한 종목의 시그널을 평가하고 실행합니다.
    async fn evaluate_asset(&self, symbol: &str) -> AssetOutcome {
        let settings = self.ctx.settings();
        let signals = self.ctx.signals();
        let timeout = settings.call_timeout();

        let watch = [symbol.to_string()];
        let sentiment =
            match call_with_timeout(timeout, "sentiment", signals.sentiment(&watch)).await {
                Ok(sentiment) => sentiment,
                Err(e) => {
                    warn!(error = %e, transient = e.is_retryable(), "센티먼트 조회 실패");
                    return AssetOutcome::signal_error(symbol, format!("Signal unavailable: {}", e));
                }
            };
        let technical = match call_with_timeout(
            timeout,
            "technical_signal",
            signals.technical_signal(symbol),
        )
        .await
        {
            Ok(technical) => technical,
            Err(e) => {
                warn!(error = %e, transient = e.is_retryable(), "기술적 시그널 조회 실패");
                return AssetOutcome::signal_error(symbol, format!("Signal unavailable: {}", e));
            }
        };

        let signal = TradeSignal::decide(sentiment, technical);
        let confidence = match signal {
            TradeSignal::Buy => settings.buy_confidence,
            TradeSignal::Sell => settings.sell_confidence,
            TradeSignal::Hold => 0.0,
        };
        debug!(
            sentiment = %sentiment,
            technical = %technical,
            signal = %signal,
            confidence = confidence,
            "시그널 결정"
        );

        let reason = format!("{} sentiment, {} technical", sentiment, technical);
        let result = self
            .ctx
            .executor()
            .execute_trade(symbol, signal, confidence, &reason)
            .await;

        AssetOutcome::from_execution(symbol, signal, &result)
    }
}

/// panic payload에서 메시지를 추출합니다.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
