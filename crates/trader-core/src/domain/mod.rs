//! 트레이딩 운영을 위한 도메인 모델.

mod gateway;
mod order;
mod position;
mod signal;
mod tick_size;
mod trade;

pub use gateway::*;
pub use order::*;
pub use position::*;
pub use signal::*;
pub use tick_size::*;
pub use trade::*;
