//! # Trader Core
//!
//! 자율 트레이딩 에이전트의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 에이전트 전반에서 사용되는 기본 타입을 제공합니다:
//! - 주문 방향, 주문 요청 및 접수 결과
//! - 실행 거래소가 보고하는 라이브 포지션 미러
//! - 시그널 라벨 (센티먼트, 기술적 시그널) 및 결정 규칙
//! - 외부 협력자 trait (`ExecutionGateway`, `SignalSource`, `PortfolioStore`)
//! - 에러 분류 체계
//! - 설정 헬퍼 및 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
