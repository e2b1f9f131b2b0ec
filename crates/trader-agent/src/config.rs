//! 파일과 환경변수 기반 설정 모듈.
//!
//! 로드 순서: `.env` → 기본값 → TOML 파일(선택) → `TRADER__` 접두사 환경변수
//! → 리스크 파라미터 평면 환경변수(`MAX_DAILY_LOSS_PCT` 등) → 범위 검증.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use trader_core::{LoggingConfig, Price, Sentiment, TechnicalSignal};
use trader_risk::{RebalanceConfig, RiskConfig};

use crate::Result;

/// 에이전트 전체 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 리스크 설정
    #[serde(default)]
    pub risk: RiskConfig,
    /// 제어 루프 설정
    #[serde(default)]
    pub agent: AgentSettings,
    /// 모의투자 협력자 설정
    #[serde(default)]
    pub paper: PaperSettings,
}

/// 제어 루프 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// 감시 종목
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,
    /// 사이클 주기 (초)
    #[serde(default = "default_loop_interval_secs")]
    pub loop_interval_secs: u64,
    /// 사이클 장애 후 대기 (초)
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
    /// 외부 호출 시간 제한 (초)
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// 매수 시그널 신뢰도
    #[serde(default = "default_buy_confidence")]
    pub buy_confidence: f64,
    /// 매도 시그널 신뢰도
    #[serde(default = "default_sell_confidence")]
    pub sell_confidence: f64,
    /// 자산 배분 목표 및 과대 비중 기준
    #[serde(default)]
    pub rebalance: RebalanceConfig,
}

fn default_watchlist() -> Vec<String> {
    vec!["BTC/USD".to_string(), "ETH/USD".to_string()]
}

fn default_loop_interval_secs() -> u64 {
    60
}

fn default_error_backoff_secs() -> u64 {
    5
}

fn default_call_timeout_secs() -> u64 {
    10
}

fn default_buy_confidence() -> f64 {
    0.85
}

fn default_sell_confidence() -> f64 {
    0.75
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            watchlist: default_watchlist(),
            loop_interval_secs: default_loop_interval_secs(),
            error_backoff_secs: default_error_backoff_secs(),
            call_timeout_secs: default_call_timeout_secs(),
            buy_confidence: default_buy_confidence(),
            sell_confidence: default_sell_confidence(),
            rebalance: RebalanceConfig::default(),
        }
    }
}

impl AgentSettings {
    /// 사이클 주기를 Duration으로 반환
    pub fn loop_interval(&self) -> Duration {
        Duration::from_secs(self.loop_interval_secs)
    }

    /// 장애 후 대기를 Duration으로 반환
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    /// 외부 호출 시간 제한을 Duration으로 반환
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }
}

/// 모의투자 종목 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperAsset {
    /// 심볼
    pub symbol: String,
    /// 초기 시세
    pub price: Price,
    /// 기술적 시그널
    #[serde(default = "default_technical")]
    pub technical: TechnicalSignal,
}

fn default_technical() -> TechnicalSignal {
    TechnicalSignal::Hold
}

/// 모의투자 협력자 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSettings {
    /// 거래 수수료율
    #[serde(default)]
    pub fee_rate: Decimal,
    /// 슬리피지율
    #[serde(default)]
    pub slippage_rate: Decimal,
    /// 시장 심리
    #[serde(default = "default_sentiment")]
    pub sentiment: Sentiment,
    /// 종목별 시세와 시그널
    #[serde(default)]
    pub assets: Vec<PaperAsset>,
}

fn default_sentiment() -> Sentiment {
    Sentiment::Neutral
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            fee_rate: Decimal::ZERO,
            slippage_rate: Decimal::ZERO,
            sentiment: default_sentiment(),
            assets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("TRADER")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("agent.watchlist")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.risk.apply_overrides(|key| std::env::var(key).ok());
        config.risk = config.risk.sanitized();

        tracing::debug!(
            watchlist = ?config.agent.watchlist,
            interval_secs = config.agent.loop_interval_secs,
            "설정 로드 완료"
        );

        Ok(config)
    }
}
