//! 자산 클래스 분류.
//!
//! 심볼 문자열만으로 자산 클래스를 추정합니다:
//! - `BTC/USD`, `ETHUSD`, `BTC` 같은 심볼은 암호화폐 (소수점 수량)
//! - 그 외 (`AAPL`, `TSLA`)는 주식 (정수 수량)

use serde::{Deserialize, Serialize};
use std::fmt;

/// 접미사 없이 보고되는 암호화폐 기준 자산.
const BARE_CRYPTO_BASES: &[&str] = &["BTC", "ETH", "SOL", "DOGE", "LTC", "AVAX"];

/// 자산 클래스.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// 암호화폐 (24/7, 소수점 수량)
    Crypto,
    /// 주식 (정수 수량)
    Stock,
}

impl AssetClass {
    /// 심볼 문자열에서 자산 클래스를 추정합니다.
    pub fn classify(symbol: &str) -> Self {
        let upper = symbol.to_uppercase();
        if upper.contains('/') || upper.contains("USD") {
            return AssetClass::Crypto;
        }
        if BARE_CRYPTO_BASES.contains(&upper.as_str()) {
            return AssetClass::Crypto;
        }
        AssetClass::Stock
    }

    /// 소수점 수량 거래 여부.
    pub fn is_fractional(&self) -> bool {
        matches!(self, AssetClass::Crypto)
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Crypto => write!(f, "crypto"),
            AssetClass::Stock => write!(f, "stock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_crypto() {
        assert_eq!(AssetClass::classify("BTC/USD"), AssetClass::Crypto);
        assert_eq!(AssetClass::classify("ETHUSD"), AssetClass::Crypto);
        assert_eq!(AssetClass::classify("btc"), AssetClass::Crypto);
        assert!(AssetClass::classify("SOL/USDT").is_fractional());
    }

    #[test]
    fn test_classify_stock() {
        assert_eq!(AssetClass::classify("AAPL"), AssetClass::Stock);
        assert_eq!(AssetClass::classify("NVDA"), AssetClass::Stock);
        assert!(!AssetClass::Stock.is_fractional());
    }

    #[test]
    fn test_display() {
        assert_eq!(AssetClass::Crypto.to_string(), "crypto");
        assert_eq!(AssetClass::Stock.to_string(), "stock");
    }
}
