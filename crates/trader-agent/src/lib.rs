//! 리스크 게이트 기반 자율 트레이딩 에이전트.
//!
//! 이 crate는 다음을 제공합니다:
//! - 프로세스 단위 실행 컨텍스트 (`AgentContext`)
//! - 주기적 제어 루프 (모니터 → 배분 점검 → 일일 게이트 → 종목별 실행)
//! - 사이클 결과 보고서
//! - 파일/환경변수 설정 로드

pub mod config;
pub mod context;
pub mod control_loop;
pub mod error;
pub mod stats;

pub use config::{AgentSettings, AppConfig, PaperAsset, PaperSettings};
pub use context::AgentContext;
pub use control_loop::{AgentStatus, ControlLoop};
pub use error::{AgentError, Result};
pub use stats::{AssetOutcome, CycleReport, ExitOutcome};
