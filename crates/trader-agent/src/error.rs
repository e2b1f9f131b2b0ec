//! 에러 타입 정의.

use thiserror::Error;
use trader_core::TraderError;

/// 에이전트 에러 타입
#[derive(Debug, Error)]
pub enum AgentError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// 트레이딩 에러
    #[error(transparent)]
    Trader(#[from] TraderError),

    /// 직렬화 에러
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, AgentError>;
