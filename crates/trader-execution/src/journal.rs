//! 인메모리 거래 기록 및 성과 지표.
//!
//! `PortfolioStore` 구현체로, executor가 전달한 진입/청산을 기록하고
//! 승률, 프로핏 팩터, 샤프 비율 등의 성과 요약을 계산합니다.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use trader_core::{GatewayError, GatewayResult, PortfolioStore, Price, TradeRecord};

/// 기록 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Open,
    Closed,
}

/// 거래 기록 항목.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// 진입 기록
    pub record: TradeRecord,
    /// 상태
    pub status: EntryStatus,
    /// 청산 가격
    pub exit_price: Option<Price>,
    /// 청산 시각
    pub closed_at: Option<DateTime<Utc>>,
    /// 실현 손익
    pub pnl: Option<Decimal>,
    /// 실현 손익률 (%, 포지션 가치 대비)
    pub pnl_pct: Option<Decimal>,
}

impl JournalEntry {
    fn open(record: TradeRecord) -> Self {
        Self {
            record,
            status: EntryStatus::Open,
            exit_price: None,
            closed_at: None,
            pnl: None,
            pnl_pct: None,
        }
    }

    fn close(&mut self, exit_price: Price, pnl: Decimal, at: DateTime<Utc>) {
        self.status = EntryStatus::Closed;
        self.exit_price = Some(exit_price);
        self.closed_at = Some(at);
        self.pnl = Some(pnl);
        self.pnl_pct = if self.record.position_value > Decimal::ZERO {
            Some(pnl / self.record.position_value * Decimal::ONE_HUNDRED)
        } else {
            Some(Decimal::ZERO)
        };
    }

    /// 청산 여부.
    pub fn is_closed(&self) -> bool {
        self.status == EntryStatus::Closed
    }
}

/// 성과 요약 (소수점 2자리 반올림).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// 청산된 거래 수
    pub total_trades: usize,
    /// 수익 거래 수 (pnl > 0)
    pub winning_trades: usize,
    /// 손실 거래 수 (pnl <= 0)
    pub losing_trades: usize,
    /// 승률 (%)
    pub win_rate: Decimal,
    /// 총 실현 손익
    pub total_pnl: Decimal,
    /// 평균 수익
    pub avg_win: Decimal,
    /// 평균 손실 (절대값)
    pub avg_loss: Decimal,
    /// 프로핏 팩터 (손실이 없으면 0)
    pub profit_factor: Decimal,
    /// 샤프 비율 (거래별 손익률 기준, 비연율화)
    pub sharpe_ratio: Decimal,
    /// 최고 거래 손익
    pub best_trade: Decimal,
    /// 최저 거래 손익
    pub worst_trade: Decimal,
}

/// 일별 요약.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    /// 날짜 (UTC)
    pub date: NaiveDate,
    /// 해당 날짜에 진입한 거래 수
    pub trades_executed: usize,
    /// 그 중 청산된 거래 수
    pub trades_closed: usize,
    /// 청산된 거래의 손익 합계
    pub daily_pnl: Decimal,
    /// 해당 날짜 진입 거래
    pub trades: Vec<JournalEntry>,
}

/// 인메모리 거래 기록.
#[derive(Debug, Default)]
pub struct TradeJournal {
    entries: RwLock<Vec<JournalEntry>>,
}

impl TradeJournal {
    /// 빈 기록 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 항목 (진입 순).
    pub async fn entries(&self) -> Vec<JournalEntry> {
        self.entries.read().await.clone()
    }

    /// 오픈 거래.
    pub async fn open_trades(&self) -> Vec<JournalEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| !e.is_closed())
            .cloned()
            .collect()
    }

    /// 청산된 거래.
    pub async fn closed_trades(&self) -> Vec<JournalEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.is_closed())
            .cloned()
            .collect()
    }

    /// 청산된 거래 기준 성과 요약.
    pub async fn performance(&self) -> PerformanceSummary {
        let closed = self.closed_trades().await;
        summarize(&closed)
    }

    /// 지정한 날짜의 거래 요약.
    pub async fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        let trades: Vec<JournalEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.record.opened_at.date_naive() == date)
            .cloned()
            .collect();

        let closed: Vec<&JournalEntry> = trades.iter().filter(|e| e.is_closed()).collect();
        let daily_pnl: Decimal = closed.iter().filter_map(|e| e.pnl).sum();

        DailySummary {
            date,
            trades_executed: trades.len(),
            trades_closed: closed.len(),
            daily_pnl: daily_pnl.round_dp(2),
            trades,
        }
    }
}

#[async_trait]
impl PortfolioStore for TradeJournal {
    async fn log_open(&self, record: TradeRecord) -> GatewayResult<()> {
        debug!(symbol = %record.symbol, order_id = %record.order_id, "진입 기록");
        self.entries.write().await.push(JournalEntry::open(record));
        Ok(())
    }

    async fn log_close(&self, symbol: &str, exit_price: Price, pnl: Decimal) -> GatewayResult<()> {
        let mut entries = self.entries.write().await;

        // 해당 심볼의 가장 최근 오픈 기록을 청산
        let entry = entries
            .iter_mut()
            .rev()
            .find(|e| e.record.symbol == symbol && !e.is_closed());

        match entry {
            Some(entry) => {
                entry.close(exit_price, pnl, Utc::now());
                debug!(symbol = symbol, pnl = %pnl, "청산 기록");
                Ok(())
            }
            None => {
                warn!(symbol = symbol, "청산할 오픈 기록 없음");
                Err(GatewayError::NotFound(format!("open trade for {}", symbol)))
            }
        }
    }
}

/// 청산된 거래로부터 성과 요약 계산.
fn summarize(closed: &[JournalEntry]) -> PerformanceSummary {
    if closed.is_empty() {
        return PerformanceSummary::default();
    }

    let pnls: Vec<Decimal> = closed.iter().filter_map(|e| e.pnl).collect();
    let wins: Vec<Decimal> = pnls.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
    let losses: Vec<Decimal> = pnls.iter().copied().filter(|p| *p <= Decimal::ZERO).collect();

    let total = pnls.len();
    let gross_profit: Decimal = wins.iter().sum();
    let gross_loss: Decimal = losses.iter().sum::<Decimal>().abs();

    let avg_win = mean(&wins);
    let avg_loss = mean(&losses).abs();

    let profit_factor = if gross_loss > Decimal::ZERO {
        gross_profit / gross_loss
    } else {
        Decimal::ZERO
    };

    let returns: Vec<Decimal> = closed.iter().filter_map(|e| e.pnl_pct).collect();

    PerformanceSummary {
        total_trades: total,
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        win_rate: (Decimal::from(wins.len()) / Decimal::from(total) * Decimal::ONE_HUNDRED)
            .round_dp(2),
        total_pnl: pnls.iter().sum::<Decimal>().round_dp(2),
        avg_win: avg_win.round_dp(2),
        avg_loss: avg_loss.round_dp(2),
        profit_factor: profit_factor.round_dp(2),
        sharpe_ratio: sharpe_ratio(&returns).round_dp(2),
        best_trade: pnls.iter().copied().max().unwrap_or_default().round_dp(2),
        worst_trade: pnls.iter().copied().min().unwrap_or_default().round_dp(2),
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

/// 거래별 손익률의 평균 / 모표준편차.
///
/// 2건 미만이거나 표준편차가 0이면 0.
fn sharpe_ratio(returns: &[Decimal]) -> Decimal {
    if returns.len() < 2 {
        return Decimal::ZERO;
    }

    let avg = mean(returns);
    let variance = returns
        .iter()
        .map(|r| (*r - avg) * (*r - avg))
        .sum::<Decimal>()
        / Decimal::from(returns.len());

    let std_dev = decimal_sqrt(variance);
    if std_dev.is_zero() {
        return Decimal::ZERO;
    }

    avg / std_dev
}

/// Decimal 제곱근 (뉴턴 방법, 최대 50회, 정밀도 1e-10).
fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut guess = value / Decimal::TWO;
    let precision = Decimal::new(1, 10);

    for _ in 0..50 {
        let next = (guess + value / guess) / Decimal::TWO;
        if (next - guess).abs() < precision {
            return next;
        }
        guess = next;
    }

    guess
}
