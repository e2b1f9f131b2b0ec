//! Trading agent CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use trader_agent::{AgentContext, AppConfig, ControlLoop};
use trader_core::{init_logging, LogConfig};

#[derive(Parser)]
#[command(name = "trader-agent")]
#[command(about = "Risk-gated autonomous trading agent (paper mode)", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로 (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 제어 루프 실행 (Ctrl-C로 종료)
    Run,

    /// 사이클 한 번 실행 후 결과 출력
    Once,

    /// 리스크 지표 출력
    Metrics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(LogConfig::from_section(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let ctx = Arc::new(AgentContext::paper(&config).await);
    let control = ControlLoop::new(ctx).await;

    match cli.command {
        Commands::Run => {
            control.start().await;

            tokio::signal::ctrl_c().await?;
            tracing::info!("종료 신호 수신, 제어 루프 종료 중...");
            control.stop().await;

            let performance = control.context().journal().performance().await;
            println!("{}", serde_json::to_string_pretty(&performance)?);
        }
        Commands::Once => {
            let report = control.run_cycle().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Metrics => {
            let metrics = control.risk_metrics().await;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
    }

    Ok(())
}
