//! 리스크 관리 시스템.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 일일 손실 한도 게이트
//! - Kelly 기반 포지션 사이징
//! - 신규 진입 검증
//! - 손절/익절 가격 계산
//! - 오픈 포지션 손절/익절 모니터
//! - 자산 배분 점검 (권고 전용)
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_risk::{RiskManager, RiskConfig};
//!
//! let mut manager = RiskManager::new(RiskConfig::default());
//!
//! if manager.can_trade().is_open() {
//!     let sizing = manager.size_position("AAPL", 0.85, price);
//!     let validation = manager.validate_trade(Side::Buy, sizing.shares(), price);
//! }
//! ```

pub mod config;
pub mod limits;
pub mod manager;
pub mod monitor;
pub mod position_sizing;
pub mod rebalance;
pub mod stop_loss;
pub mod validation;

// 주요 타입 재내보내기
pub use config::{ConfigIssue, RiskConfig};
pub use limits::{GateDecision, RiskState};
pub use manager::{RiskManager, RiskMetrics};
pub use monitor::{ExitReason, ExitSignal, RiskMonitor};
pub use position_sizing::{PositionSizer, SizingResult};
pub use rebalance::{Allocation, RebalanceAdvice, RebalanceConfig, Rebalancer};
pub use stop_loss::{ProtectiveLevels, StopLossCalculator};
pub use validation::{RejectReason, TradeValidator, ValidationResult};
