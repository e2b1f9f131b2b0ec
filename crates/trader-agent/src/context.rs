//! 프로세스 단위 실행 컨텍스트.
//!
//! 기동 시 한 번 생성되어 제어 루프와 수동 실행 경로가 함께 참조합니다.
//! 리스크 매니저는 이 컨텍스트를 통해서만 공유됩니다.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use trader_core::{call_with_timeout, ExecutionGateway, SignalSource};
use trader_exchange::{FixedSignalSource, PaperConfig, PaperGateway};
use trader_execution::{TradeExecutor, TradeJournal};
use trader_risk::{RiskManager, RiskMetrics};

use crate::config::{AgentSettings, AppConfig};

/// 에이전트 실행 컨텍스트
pub struct AgentContext {
    settings: AgentSettings,
    risk_manager: Arc<RwLock<RiskManager>>,
    executor: TradeExecutor,
    signals: Arc<dyn SignalSource>,
    journal: Arc<TradeJournal>,
}

impl AgentContext {
    /// 협력자들로 컨텍스트 생성
    pub fn new(
        config: &AppConfig,
        gateway: Arc<dyn ExecutionGateway>,
        signals: Arc<dyn SignalSource>,
        journal: Arc<TradeJournal>,
    ) -> Self {
        let risk_manager = Arc::new(RwLock::new(RiskManager::new(config.risk.clone())));
        let executor = TradeExecutor::new(
            gateway,
            Arc::clone(&risk_manager),
            config.agent.call_timeout(),
        )
        .with_store(journal.clone());

        Self {
            settings: config.agent.clone(),
            risk_manager,
            executor,
            signals,
            journal,
        }
    }

    /// 모의투자 협력자로 컨텍스트 생성
    pub async fn paper(config: &AppConfig) -> Self {
        let gateway = PaperGateway::new(
            PaperConfig::default()
                .with_initial_cash(config.risk.initial_capital)
                .with_fee_rate(config.paper.fee_rate)
                .with_slippage_rate(config.paper.slippage_rate),
        );
        let signals = FixedSignalSource::new();
        signals.set_sentiment(config.paper.sentiment).await;

        for asset in &config.paper.assets {
            gateway.set_price(&asset.symbol, asset.price).await;
            signals.set_technical(&asset.symbol, asset.technical).await;
        }

        Self::new(
            config,
            Arc::new(gateway),
            Arc::new(signals),
            Arc::new(TradeJournal::new()),
        )
    }

    /// 제어 루프 설정
    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// 공유 리스크 매니저
    pub fn risk_manager(&self) -> &Arc<RwLock<RiskManager>> {
        &self.risk_manager
    }

    /// 거래 실행기
    pub fn executor(&self) -> &TradeExecutor {
        &self.executor
    }

    /// 시그널 소스
    pub fn signals(&self) -> &Arc<dyn SignalSource> {
        &self.signals
    }

    /// 거래 기록
    pub fn journal(&self) -> &Arc<TradeJournal> {
        &self.journal
    }

    /// 라이브 포지션과 자산으로 상태를 맞춘 뒤 리스크 지표를 반환합니다.
    ///
    /// 거래소 조회가 실패하면 내부 상태만으로 계산합니다.
    pub async fn risk_metrics(&self) -> RiskMetrics {
        let gateway = self.executor.gateway();
        let timeout = self.settings.call_timeout();

        let positions = match call_with_timeout(timeout, "positions", gateway.positions()).await {
            Ok(positions) => Some(positions),
            Err(e) => {
                warn!(error = %e, "포지션 조회 실패, 내부 상태 사용");
                None
            }
        };
        let equity = match call_with_timeout(timeout, "account", gateway.account()).await {
            Ok(account) => Some(account.equity),
            Err(e) => {
                warn!(error = %e, "계좌 조회 실패, 내부 상태 사용");
                None
            }
        };

        self.risk_manager
            .write()
            .await
            .risk_metrics(positions.as_deref(), equity)
    }
}
