//! 외부 협력자 추상화.
//!
//! 제어 루프가 호출하는 외부 협력자의 인터페이스를 정의합니다:
//! - `ExecutionGateway` - 시세 조회, 주문 제출, 포지션/계좌 조회, 청산
//! - `SignalSource` - 센티먼트 및 기술적 시그널
//! - `PortfolioStore` - 체결/청산 기록 저장
//!
//! 모든 호출은 [`call_with_timeout`]으로 감싸져 느린 협력자가
//! 루프를 멈추지 못하도록 합니다.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::{
    AccountSnapshot, ClosedPosition, OrderReceipt, OrderRequest, Position, Sentiment,
    TechnicalSignal, TradeRecord,
};
use crate::types::Price;

// =============================================================================
// 에러 타입
// =============================================================================

/// 외부 협력자 호출 에러.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// API 에러
    #[error("API 에러: {0}")]
    Api(String),

    /// 대상 없음 (포지션, 심볼 등)
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 호출 시간 초과
    #[error("시간 초과: {0}")]
    Timeout(String),

    /// 거래소가 주문을 거부함
    #[error("주문 거부: {0}")]
    Rejected(String),

    /// 기타 에러
    #[error("기타 에러: {0}")]
    Other(String),
}

impl GatewayError {
    /// 일시적인 장애인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Network(_) | GatewayError::Timeout(_))
    }
}

/// 협력자 호출 결과.
pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// ExecutionGateway Trait
// =============================================================================

/// 실행 거래소 trait.
///
/// 실계좌 브로커, 모의 거래소 모두 이 trait를 구현합니다.
/// 포지션은 거래소가 소유하며 코어는 읽고 반응만 합니다.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// 거래소 이름 (로깅용).
    fn venue_name(&self) -> &str;

    /// 현재 가격 조회.
    ///
    /// 시세가 없으면 `Ok(None)`을 반환합니다.
    async fn current_price(&self, symbol: &str) -> GatewayResult<Option<Price>>;

    /// 주문 제출.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Rejected`: 거래소가 주문을 거부
    /// - `GatewayError::Network`: 네트워크 연결 실패
    async fn submit_order(&self, order: &OrderRequest) -> GatewayResult<OrderReceipt>;

    /// 현재 보유 포지션 조회. 포지션이 없으면 빈 벡터.
    async fn positions(&self) -> GatewayResult<Vec<Position>>;

    /// 계좌 자산 조회.
    async fn account(&self) -> GatewayResult<AccountSnapshot>;

    /// 포지션 청산.
    ///
    /// # Errors
    ///
    /// - `GatewayError::NotFound`: 해당 심볼의 포지션이 없음
    async fn close_position(&self, symbol: &str) -> GatewayResult<ClosedPosition>;
}

// =============================================================================
// SignalSource Trait
// =============================================================================

/// 시그널 소스 trait.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// 심볼 목록에 대한 센티먼트.
    async fn sentiment(&self, symbols: &[String]) -> GatewayResult<Sentiment>;

    /// 단일 심볼의 기술적 시그널.
    async fn technical_signal(&self, symbol: &str) -> GatewayResult<TechnicalSignal>;
}

// =============================================================================
// PortfolioStore Trait
// =============================================================================

/// 체결 기록 저장소 trait.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// 진입 기록.
    async fn log_open(&self, record: TradeRecord) -> GatewayResult<()>;

    /// 청산 기록.
    async fn log_close(&self, symbol: &str, exit_price: Price, pnl: Decimal) -> GatewayResult<()>;
}

// =============================================================================
// 타임아웃
// =============================================================================

/// 협력자 호출을 시간 제한으로 감쌉니다.
///
/// 제한을 넘기면 `GatewayError::Timeout`을 반환하며, 호출 자체의 에러는 그대로 전달됩니다.
pub async fn call_with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(format!(
            "{} ({}ms)",
            operation,
            limit.as_millis()
        ))),
    }
}

// =============================================================================
// 테스트
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    /// 테스트용 MockGateway.
    struct MockGateway {
        should_fail: bool,
    }

    #[async_trait]
    impl ExecutionGateway for MockGateway {
        fn venue_name(&self) -> &str {
            "mock"
        }

        async fn current_price(&self, symbol: &str) -> GatewayResult<Option<Price>> {
            if self.should_fail {
                return Err(GatewayError::Network("Mock network error".to_string()));
            }
            Ok((symbol == "AAPL").then_some(dec!(100)))
        }

        async fn submit_order(&self, order: &OrderRequest) -> GatewayResult<OrderReceipt> {
            if self.should_fail {
                return Err(GatewayError::Rejected("Mock rejection".to_string()));
            }
            Ok(OrderReceipt {
                order_id: "mock-1".to_string(),
                symbol: order.symbol.clone(),
                side: order.side,
                quantity: order.quantity,
                submitted_at: Utc::now(),
            })
        }

        async fn positions(&self) -> GatewayResult<Vec<Position>> {
            Ok(vec![Position::long("AAPL", dec!(5), dec!(100), dec!(101))])
        }

        async fn account(&self) -> GatewayResult<AccountSnapshot> {
            Ok(AccountSnapshot {
                equity: dec!(10000),
                cash: dec!(9495),
                portfolio_value: dec!(10000),
            })
        }

        async fn close_position(&self, symbol: &str) -> GatewayResult<ClosedPosition> {
            Err(GatewayError::NotFound(symbol.to_string()))
        }
    }

    #[tokio::test]
    async fn test_mock_gateway_success() {
        let gateway = MockGateway { should_fail: false };

        assert_eq!(gateway.venue_name(), "mock");
        assert_eq!(gateway.current_price("AAPL").await.unwrap(), Some(dec!(100)));
        assert_eq!(gateway.current_price("MSFT").await.unwrap(), None);

        let order = OrderRequest::market("AAPL", Side::Buy, dec!(5)).with_stop_loss(dec!(97));
        let receipt = gateway.submit_order(&order).await.unwrap();
        assert_eq!(receipt.quantity, dec!(5));

        assert_eq!(gateway.positions().await.unwrap().len(), 1);
        assert_eq!(gateway.account().await.unwrap().equity, dec!(10000));
    }

    #[tokio::test]
    async fn test_mock_gateway_errors() {
        let gateway = MockGateway { should_fail: true };

        let result = gateway.current_price("AAPL").await;
        assert!(matches!(result, Err(GatewayError::Network(_))));
        assert!(result.unwrap_err().is_retryable());

        let order = OrderRequest::market("AAPL", Side::Buy, dec!(5));
        let result = gateway.submit_order(&order).await;
        assert!(matches!(result, Err(GatewayError::Rejected(_))));

        let result = gateway.close_position("TSLA").await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_with_timeout_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, GatewayError>(1)
        };

        let result = call_with_timeout(Duration::from_secs(1), "get_price", slow).await;
        match result {
            Err(GatewayError::Timeout(msg)) => assert!(msg.contains("get_price")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_call_with_timeout_passes_through() {
        let ok = call_with_timeout(Duration::from_secs(1), "ok", async { Ok::<_, GatewayError>(7) })
            .await;
        assert_eq!(ok.unwrap(), 7);

        let err = call_with_timeout(Duration::from_secs(1), "err", async {
            Err::<u32, _>(GatewayError::Api("boom".to_string()))
        })
        .await;
        assert!(matches!(err, Err(GatewayError::Api(_))));
    }
}
