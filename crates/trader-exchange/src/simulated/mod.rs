//! 모의투자 거래소와 고정 시그널 소스.
//!
//! 이 모듈은 다음을 제공합니다:
//! - 메모리 내 시세/현금/포지션으로 즉시 체결하는 모의 거래소
//! - 미리 정한 값을 반환하는 시그널 소스
//! - 테스트용 장애 주입 (시세 실패, 주문 거부, 지연)
//!
//! # 예제
//!
//! ```ignore
//! use trader_exchange::simulated::{PaperGateway, PaperConfig};
//!
//! let gateway = PaperGateway::new(PaperConfig::default().with_initial_cash(dec!(10000)));
//! gateway.set_price("AAPL", dec!(100)).await;
//!
//! let price = gateway.current_price("AAPL").await?;
//! ```

mod exchange;
mod signals;

pub use exchange::{PaperConfig, PaperGateway};
pub use signals::FixedSignalSource;
