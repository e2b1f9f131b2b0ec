//! 모의투자 거래소 구현.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use trader_core::{
    AccountSnapshot, ClosedPosition, ExecutionGateway, GatewayError, GatewayResult, OrderReceipt,
    OrderRequest, Position, Price, Quantity, Side,
};

/// 모의투자 거래소 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// 초기 현금
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
    /// 거래 수수료율 (예: 0.1%의 경우 0.001)
    #[serde(default)]
    pub fee_rate: Decimal,
    /// 시장가 주문의 슬리피지율
    #[serde(default)]
    pub slippage_rate: Decimal,
}

fn default_initial_cash() -> Decimal {
    dec!(10000)
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            fee_rate: Decimal::ZERO,
            slippage_rate: Decimal::ZERO,
        }
    }
}

impl PaperConfig {
    /// 초기 현금을 설정합니다.
    pub fn with_initial_cash(mut self, cash: Decimal) -> Self {
        self.initial_cash = cash;
        self
    }

    /// 수수료율을 설정합니다.
    pub fn with_fee_rate(mut self, rate: Decimal) -> Self {
        self.fee_rate = rate;
        self
    }

    /// 슬리피지율을 설정합니다.
    pub fn with_slippage_rate(mut self, rate: Decimal) -> Self {
        self.slippage_rate = rate;
        self
    }
}

/// 보유 수량과 평균 단가.
#[derive(Debug, Clone)]
struct Holding {
    qty: Quantity,
    avg_price: Price,
}

/// 테스트용 장애 주입 설정.
#[derive(Debug, Clone, Default)]
struct FaultPlan {
    /// 시세 조회가 실패하는 심볼
    failing_quotes: HashSet<String>,
    /// 시세 조회 시 panic하는 심볼
    panicking_quotes: HashSet<String>,
    /// 주문 거부 여부
    reject_orders: bool,
    /// 모든 호출에 적용되는 지연
    latency: Option<Duration>,
}

/// 내부 계정 상태.
#[derive(Debug)]
struct PaperState {
    cash: Decimal,
    prices: HashMap<String, Price>,
    holdings: HashMap<String, Holding>,
    orders: Vec<OrderRequest>,
    realized_pnl: Decimal,
    faults: FaultPlan,
}

impl PaperState {
    fn new(config: &PaperConfig) -> Self {
        Self {
            cash: config.initial_cash,
            prices: HashMap::new(),
            holdings: HashMap::new(),
            orders: Vec::new(),
            realized_pnl: Decimal::ZERO,
            faults: FaultPlan::default(),
        }
    }

    fn position(&self, symbol: &str, holding: &Holding) -> Position {
        let current = self
            .prices
            .get(symbol)
            .copied()
            .unwrap_or(holding.avg_price);
        Position::long(symbol, holding.qty, holding.avg_price, current)
    }

    fn market_value(&self) -> Decimal {
        self.holdings
            .iter()
            .map(|(symbol, holding)| self.position(symbol, holding).market_value)
            .sum()
    }
}

/// 모의투자 실행 거래소.
///
/// 시세는 `set_price`로 주입하며 시장가 주문은 즉시 체결됩니다.
/// 롱 포지션만 지원하며 보유 수량을 넘는 매도는 거부됩니다.
pub struct PaperGateway {
    config: PaperConfig,
    state: RwLock<PaperState>,
}

impl Default for PaperGateway {
    fn default() -> Self {
        Self::new(PaperConfig::default())
    }
}

impl PaperGateway {
    /// 새 모의투자 거래소를 생성합니다.
    pub fn new(config: PaperConfig) -> Self {
        let state = PaperState::new(&config);
        Self {
            config,
            state: RwLock::new(state),
        }
    }

    /// 설정 참조.
    pub fn config(&self) -> &PaperConfig {
        &self.config
    }

    /// 심볼의 현재가를 설정합니다.
    pub async fn set_price(&self, symbol: &str, price: Price) {
        self.state
            .write()
            .await
            .prices
            .insert(symbol.to_string(), price);
    }

    /// 현금 변동 없이 기존 포지션을 추가합니다.
    pub async fn insert_position(&self, symbol: &str, qty: Quantity, avg_price: Price) {
        self.state
            .write()
            .await
            .holdings
            .insert(symbol.to_string(), Holding { qty, avg_price });
    }

    /// 현금 잔고.
    pub async fn cash(&self) -> Decimal {
        self.state.read().await.cash
    }

    /// 누적 실현 손익.
    pub async fn realized_pnl(&self) -> Decimal {
        self.state.read().await.realized_pnl
    }

    /// 제출된 주문 이력.
    pub async fn submitted_orders(&self) -> Vec<OrderRequest> {
        self.state.read().await.orders.clone()
    }

    /// 심볼의 시세 조회를 실패시킵니다.
    pub async fn fail_quotes_for(&self, symbol: &str) {
        self.state
            .write()
            .await
            .faults
            .failing_quotes
            .insert(symbol.to_string());
    }

    /// 심볼의 시세 조회 시 panic합니다.
    pub async fn panic_quotes_for(&self, symbol: &str) {
        self.state
            .write()
            .await
            .faults
            .panicking_quotes
            .insert(symbol.to_string());
    }

    /// 주문 거부 여부를 설정합니다.
    pub async fn set_reject_orders(&self, reject: bool) {
        self.state.write().await.faults.reject_orders = reject;
    }

    /// 모든 호출에 지연을 설정합니다.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().await.faults.latency = latency;
    }

    /// 주입된 장애를 모두 해제합니다.
    pub async fn clear_faults(&self) {
        self.state.write().await.faults = FaultPlan::default();
    }

    async fn simulate_latency(&self) {
        let latency = self.state.read().await.faults.latency;
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
    }

    /// 슬리피지가 반영된 체결 가격.
    fn fill_price(&self, price: Price, side: Side) -> Price {
        match side {
            Side::Buy => price * (Decimal::ONE + self.config.slippage_rate),
            Side::Sell => price * (Decimal::ONE - self.config.slippage_rate),
        }
    }
}

#[async_trait]
impl ExecutionGateway for PaperGateway {
    fn venue_name(&self) -> &str {
        "paper"
    }

    async fn current_price(&self, symbol: &str) -> GatewayResult<Option<Price>> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        if state.faults.panicking_quotes.contains(symbol) {
            panic!("simulated quote panic for {}", symbol);
        }
        if state.faults.failing_quotes.contains(symbol) {
            return Err(GatewayError::Network(format!("quote feed down for {}", symbol)));
        }
        Ok(state.prices.get(symbol).copied())
    }

    async fn submit_order(&self, order: &OrderRequest) -> GatewayResult<OrderReceipt> {
        self.simulate_latency().await;

        let mut state = self.state.write().await;
        if state.faults.reject_orders {
            return Err(GatewayError::Rejected("orders disabled".to_string()));
        }
        if order.quantity <= Decimal::ZERO {
            return Err(GatewayError::Rejected("quantity must be positive".to_string()));
        }

        let quote = state
            .prices
            .get(&order.symbol)
            .copied()
            .ok_or_else(|| GatewayError::Rejected(format!("no quote for {}", order.symbol)))?;
        let price = self.fill_price(quote, order.side);
        let notional = order.quantity * price;
        let fee = notional * self.config.fee_rate;

        match order.side {
            Side::Buy => {
                if state.cash < notional + fee {
                    return Err(GatewayError::Rejected("insufficient buying power".to_string()));
                }
                state.cash -= notional + fee;

                let holding = state
                    .holdings
                    .entry(order.symbol.clone())
                    .or_insert(Holding {
                        qty: Decimal::ZERO,
                        avg_price: price,
                    });
                let total_qty = holding.qty + order.quantity;
                holding.avg_price =
                    (holding.qty * holding.avg_price + order.quantity * price) / total_qty;
                holding.qty = total_qty;
            }
            Side::Sell => {
                let held = state
                    .holdings
                    .get(&order.symbol)
                    .map(|h| (h.qty, h.avg_price));
                let Some((held_qty, avg_price)) = held.filter(|(q, _)| *q >= order.quantity)
                else {
                    return Err(GatewayError::Rejected(format!(
                        "insufficient position in {}",
                        order.symbol
                    )));
                };

                state.cash += notional - fee;
                state.realized_pnl += (price - avg_price) * order.quantity - fee;
                if held_qty == order.quantity {
                    state.holdings.remove(&order.symbol);
                } else if let Some(holding) = state.holdings.get_mut(&order.symbol) {
                    holding.qty -= order.quantity;
                }
            }
        }

        state.orders.push(order.clone());

        let receipt = OrderReceipt {
            order_id: uuid::Uuid::new_v4().to_string(),
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            submitted_at: Utc::now(),
        };
        debug!(
            order_id = %receipt.order_id,
            symbol = %order.symbol,
            side = %order.side,
            qty = %order.quantity,
            price = %price,
            "모의 주문 체결"
        );

        Ok(receipt)
    }

    async fn positions(&self) -> GatewayResult<Vec<Position>> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        let mut positions: Vec<Position> = state
            .holdings
            .iter()
            .map(|(symbol, holding)| state.position(symbol, holding))
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    async fn account(&self) -> GatewayResult<AccountSnapshot> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        let equity = state.cash + state.market_value();
        Ok(AccountSnapshot {
            equity,
            cash: state.cash,
            portfolio_value: equity,
        })
    }

    async fn close_position(&self, symbol: &str) -> GatewayResult<ClosedPosition> {
        self.simulate_latency().await;

        let mut state = self.state.write().await;
        let holding = state
            .holdings
            .remove(symbol)
            .ok_or_else(|| GatewayError::NotFound(format!("no position in {}", symbol)))?;

        let quote = state
            .prices
            .get(symbol)
            .copied()
            .unwrap_or(holding.avg_price);
        let price = self.fill_price(quote, Side::Sell);
        let notional = holding.qty * price;
        let fee = notional * self.config.fee_rate;
        let pnl = (price - holding.avg_price) * holding.qty - fee;

        state.cash += notional - fee;
        state.realized_pnl += pnl;

        info!(symbol = symbol, exit_price = %price, pnl = %pnl, "모의 포지션 청산");

        Ok(ClosedPosition::new(symbol, price, pnl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buy_then_close() {
        let gateway = PaperGateway::default();
        gateway.set_price("AAPL", dec!(100)).await;

        let order = OrderRequest::market("AAPL", Side::Buy, dec!(5));
        gateway.submit_order(&order).await.unwrap();
        assert_eq!(gateway.cash().await, dec!(9500));

        gateway.set_price("AAPL", dec!(110)).await;
        let positions = gateway.positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].unrealized_pnl, dec!(50));
        assert_eq!(positions[0].unrealized_pnl_pct, dec!(10));

        let account = gateway.account().await.unwrap();
        assert_eq!(account.equity, dec!(10050));

        let closed = gateway.close_position("AAPL").await.unwrap();
        assert_eq!(closed.exit_price, dec!(110));
        assert_eq!(closed.pnl, dec!(50));
        assert_eq!(gateway.cash().await, dec!(10050));
        assert!(gateway.positions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_average_price_on_add() {
        let gateway = PaperGateway::default();
        gateway.set_price("ETH/USD", dec!(2000)).await;
        gateway
            .submit_order(&OrderRequest::market("ETH/USD", Side::Buy, dec!(1)))
            .await
            .unwrap();
        gateway.set_price("ETH/USD", dec!(3000)).await;
        gateway
            .submit_order(&OrderRequest::market("ETH/USD", Side::Buy, dec!(1)))
            .await
            .unwrap();

        let positions = gateway.positions().await.unwrap();
        assert_eq!(positions[0].qty, dec!(2));
        assert_eq!(positions[0].entry_price, dec!(2500));
    }

    #[tokio::test]
    async fn test_insufficient_cash_rejected() {
        let gateway = PaperGateway::new(PaperConfig::default().with_initial_cash(dec!(100)));
        gateway.set_price("AAPL", dec!(150)).await;

        let err = gateway
            .submit_order(&OrderRequest::market("AAPL", Side::Buy, dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_sell_without_position_rejected() {
        let gateway = PaperGateway::default();
        gateway.set_price("AAPL", dec!(150)).await;

        let result = gateway
            .submit_order(&OrderRequest::market("AAPL", Side::Sell, dec!(1)))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_partial_sell_realizes_pnl() {
        let gateway = PaperGateway::default();
        gateway.insert_position("AAPL", dec!(10), dec!(100)).await;
        gateway.set_price("AAPL", dec!(120)).await;

        gateway
            .submit_order(&OrderRequest::market("AAPL", Side::Sell, dec!(4)))
            .await
            .unwrap();

        assert_eq!(gateway.realized_pnl().await, dec!(80));
        assert_eq!(gateway.positions().await.unwrap()[0].qty, dec!(6));
    }

    #[tokio::test]
    async fn test_fees_and_slippage() {
        let gateway = PaperGateway::new(
            PaperConfig::default()
                .with_fee_rate(dec!(0.001))
                .with_slippage_rate(dec!(0.01)),
        );
        gateway.set_price("AAPL", dec!(100)).await;
        gateway
            .submit_order(&OrderRequest::market("AAPL", Side::Buy, dec!(10)))
            .await
            .unwrap();

        // 101 * 10 = 1010, 수수료 1.01
        assert_eq!(gateway.cash().await, dec!(8988.99));
    }

    #[tokio::test]
    async fn test_close_unknown_position() {
        let gateway = PaperGateway::default();
        let err = gateway.close_position("TSLA").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_quote_fault_injection() {
        let gateway = PaperGateway::default();
        gateway.set_price("AAPL", dec!(100)).await;
        gateway.fail_quotes_for("AAPL").await;

        let err = gateway.current_price("AAPL").await.unwrap_err();
        assert!(err.is_retryable());

        gateway.clear_faults().await;
        assert_eq!(gateway.current_price("AAPL").await.unwrap(), Some(dec!(100)));
        assert_eq!(gateway.current_price("MSFT").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_respects_timeout() {
        let gateway = PaperGateway::default();
        gateway.set_latency(Some(Duration::from_secs(30))).await;

        let result = trader_core::call_with_timeout(
            Duration::from_secs(5),
            "account",
            gateway.account(),
        )
        .await;
        assert!(matches!(result, Err(GatewayError::Timeout(_))));
    }
}
