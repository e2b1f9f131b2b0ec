//! 거래 실행 및 체결 기록.
//!
//! 이 crate는 다음을 제공합니다:
//! - 시그널을 리스크 검사된 주문으로 변환하는 거래 실행기
//! - 포지션 청산 및 긴급 전체 청산
//! - 인메모리 거래 기록과 성과 요약
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_execution::{TradeExecutor, TradeJournal};
//!
//! let executor = TradeExecutor::new(gateway, risk_manager, Duration::from_secs(10))
//!     .with_store(Arc::new(TradeJournal::new()));
//!
//! let result = executor.execute_trade("AAPL", TradeSignal::Buy, 0.85, "bullish").await;
//! ```

pub mod executor;
pub mod journal;

// 주요 타입 재내보내기
pub use executor::{CloseAllReport, CloseOutcome, ExecutionResult, TradeExecutor, TradeStatus};
pub use journal::{DailySummary, EntryStatus, JournalEntry, PerformanceSummary, TradeJournal};
