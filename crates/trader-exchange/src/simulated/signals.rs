//! 고정 시그널 소스.
//!
//! 심리 및 기술적 시그널을 미리 정해둔 값으로 반환합니다.
//! 모의투자와 통합 테스트에서 사용합니다.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;
use trader_core::{GatewayError, GatewayResult, Sentiment, SignalSource, TechnicalSignal};

#[derive(Debug, Default)]
struct SignalState {
    sentiment: Option<Sentiment>,
    technical: HashMap<String, TechnicalSignal>,
    failing: HashSet<String>,
    sentiment_down: bool,
    latency: Option<Duration>,
}

/// 설정된 값을 그대로 돌려주는 시그널 소스.
///
/// 설정되지 않은 값은 `Neutral` / `Hold`입니다.
#[derive(Debug, Default)]
pub struct FixedSignalSource {
    state: RwLock<SignalState>,
}

impl FixedSignalSource {
    /// 빈 시그널 소스 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 시장 심리를 설정합니다.
    pub async fn set_sentiment(&self, sentiment: Sentiment) {
        self.state.write().await.sentiment = Some(sentiment);
    }

    /// 심볼의 기술적 시그널을 설정합니다.
    pub async fn set_technical(&self, symbol: &str, signal: TechnicalSignal) {
        self.state
            .write()
            .await
            .technical
            .insert(symbol.to_string(), signal);
    }

    /// 심볼의 기술적 시그널 조회를 실패시킵니다.
    pub async fn fail_technical_for(&self, symbol: &str) {
        self.state.write().await.failing.insert(symbol.to_string());
    }

    /// 심리 조회 실패 여부를 설정합니다.
    pub async fn set_sentiment_down(&self, down: bool) {
        self.state.write().await.sentiment_down = down;
    }

    /// 모든 호출에 지연을 설정합니다.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().await.latency = latency;
    }

    async fn simulate_latency(&self) {
        let latency = self.state.read().await.latency;
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SignalSource for FixedSignalSource {
    async fn sentiment(&self, _watchlist: &[String]) -> GatewayResult<Sentiment> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        if state.sentiment_down {
            return Err(GatewayError::Network("sentiment feed down".to_string()));
        }
        Ok(state.sentiment.unwrap_or(Sentiment::Neutral))
    }

    async fn technical_signal(&self, symbol: &str) -> GatewayResult<TechnicalSignal> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        if state.failing.contains(symbol) {
            return Err(GatewayError::Api(format!("no indicators for {}", symbol)));
        }
        Ok(state
            .technical
            .get(symbol)
            .copied()
            .unwrap_or(TechnicalSignal::Hold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults() {
        let source = FixedSignalSource::new();
        assert_eq!(source.sentiment(&[]).await.unwrap(), Sentiment::Neutral);
        assert_eq!(
            source.technical_signal("AAPL").await.unwrap(),
            TechnicalSignal::Hold
        );
    }

    #[tokio::test]
    async fn test_configured_values() {
        let source = FixedSignalSource::new();
        source.set_sentiment(Sentiment::Bullish).await;
        source.set_technical("AAPL", TechnicalSignal::Buy).await;

        assert_eq!(source.sentiment(&[]).await.unwrap(), Sentiment::Bullish);
        assert_eq!(
            source.technical_signal("AAPL").await.unwrap(),
            TechnicalSignal::Buy
        );
    }

    #[tokio::test]
    async fn test_failures() {
        let source = FixedSignalSource::new();
        source.set_sentiment_down(true).await;
        source.fail_technical_for("AAPL").await;

        assert!(source.sentiment(&[]).await.is_err());
        assert!(source.technical_signal("AAPL").await.is_err());
        assert!(source.technical_signal("MSFT").await.is_ok());
    }
}
