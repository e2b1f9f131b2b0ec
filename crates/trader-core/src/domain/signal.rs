//! 트레이딩 시그널 라벨과 결정 규칙.
//!
//! 이 모듈은 시그널 소스가 반환하는 라벨과 이를 매매 결정으로 바꾸는 규칙을 정의합니다:
//! - `Sentiment` - 뉴스/센티먼트 라벨
//! - `TechnicalSignal` - 기술적 지표 라벨
//! - `TradeSignal` - 최종 매매 결정 (Buy/Sell/Hold)

use crate::domain::Side;
use serde::{Deserialize, Serialize};

/// 센티먼트 라벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// 강세
    Bullish,
    /// 약세
    Bearish,
    /// 중립
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Bullish => write!(f, "Bullish"),
            Sentiment::Bearish => write!(f, "Bearish"),
            Sentiment::Neutral => write!(f, "Neutral"),
        }
    }
}

/// 기술적 시그널 라벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnicalSignal {
    /// 매수
    Buy,
    /// 매도
    Sell,
    /// 관망
    Hold,
}

impl std::fmt::Display for TechnicalSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TechnicalSignal::Buy => write!(f, "Buy"),
            TechnicalSignal::Sell => write!(f, "Sell"),
            TechnicalSignal::Hold => write!(f, "Hold"),
        }
    }
}

/// 최종 매매 결정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSignal {
    /// 매수
    Buy,
    /// 매도
    Sell,
    /// 관망 (아무것도 하지 않음)
    Hold,
}

impl TradeSignal {
    /// 센티먼트와 기술적 시그널을 결합합니다.
    ///
    /// 매수는 강세 센티먼트와 매수 시그널이 모두 필요하고,
    /// 매도는 약세 센티먼트만으로 결정됩니다.
    pub fn decide(sentiment: Sentiment, technical: TechnicalSignal) -> Self {
        match (sentiment, technical) {
            (Sentiment::Bullish, TechnicalSignal::Buy) => TradeSignal::Buy,
            (Sentiment::Bearish, _) => TradeSignal::Sell,
            _ => TradeSignal::Hold,
        }
    }

    /// 주문 방향. Hold는 `None`.
    pub fn side(&self) -> Option<Side> {
        match self {
            TradeSignal::Buy => Some(Side::Buy),
            TradeSignal::Sell => Some(Side::Sell),
            TradeSignal::Hold => None,
        }
    }

    /// Hold 여부.
    pub fn is_hold(&self) -> bool {
        matches!(self, TradeSignal::Hold)
    }
}

impl std::fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSignal::Buy => write!(f, "Buy"),
            TradeSignal::Sell => write!(f, "Sell"),
            TradeSignal::Hold => write!(f, "Hold"),
        }
    }
}
