//! 트레이딩 에이전트의 에러 타입.
//!
//! 이 모듈은 제어 루프 전반에서 사용되는 에러 타입을 정의합니다.
//! 외부 협력자 호출 실패는 [`GatewayError`]로 표현되며,
//! 이곳의 [`TraderError`]로 감싸져 전파됩니다.

use thiserror::Error;

use crate::domain::GatewayError;

/// 핵심 트레이딩 에러.
#[derive(Debug, Error)]
pub enum TraderError {
    /// 시세 조회 실패 (해당 사이클에서 자산을 건너뜀)
    #[error("시세 조회 불가: {0}")]
    QuoteUnavailable(String),

    /// 주문 실행 또는 청산 실패 (사이클 내 재시도하지 않음)
    #[error("실행 에러: {0}")]
    Execution(String),

    /// 외부 협력자 에러
    #[error("게이트웨이 에러: {0}")]
    Gateway(#[from] GatewayError),

    /// 사이클 경계에서 포착된 기타 장애
    #[error("루프 장애: {0}")]
    LoopFault(String),
}

/// 트레이딩 작업을 위한 Result 타입.
pub type TraderResult<T> = Result<T, TraderError>;
