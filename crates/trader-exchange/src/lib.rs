//! 실행 거래소 및 시그널 소스 구현.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `ExecutionGateway` 구현: 모의투자 거래소
//! - `SignalSource` 구현: 고정 시그널 소스

pub mod simulated;

pub use simulated::{FixedSignalSource, PaperConfig, PaperGateway};
