//! Chartwatch monitor CLI.

use anyhow::Context;
use chartwatch_core::{
    init_logging, AppConfig, LogConfig, MarketDataProvider, Timeframe, WatchSymbol,
    DEFAULT_CONFIG_PATH,
};
use chartwatch_exchange::{
    BinanceConfig, BinanceMarketData, RetryPolicy, RetryingProvider, StaticProvider,
};
use chartwatch_monitor::{Analyzer, Monitor, Scheduler};
use chartwatch_notification::NotificationManager;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "chartwatch-monitor")]
#[command(about = "Chartwatch 지지/저항 및 돌파 감시 데몬", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error). 생략 시 설정 파일 값
    #[arg(long)]
    log_level: Option<String>,

    /// 감시 심볼 (쉼표로 구분, 예: "btc,eth,SOLUSDT@BINANCE")
    #[arg(long)]
    symbols: Option<String>,

    /// 거래소 대신 무작위 보행 시세 사용
    #[arg(long)]
    simulated: bool,

    /// 규칙 미일치 시 사용할 ONNX 패턴 모델
    #[cfg(feature = "ml")]
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// 분석 패스 1회 실행 후 결과 출력
    Analyze,

    /// 분석 후 돌파 감시 1회 실행
    Poll,

    /// 현재가와 24시간 변동률 출력
    Prices,

    /// 데몬 모드: 주기적 분석 + 돌파 감시
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config.display()))?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    init_logging(LogConfig::from_settings(&config.logging)).map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Chartwatch Monitor 시작");

    let symbols = match &cli.symbols {
        Some(list) => parse_symbols(list)?,
        None => config.watchlist.symbols.clone(),
    };

    let provider = build_provider(&config, cli.simulated, &symbols)?;
    let analyzer = build_analyzer(&cli, &config)?;
    let notifier = NotificationManager::from_settings(&config.notifications.telegram);
    tracing::debug!(
        provider = provider.provider_name(),
        notifiers = notifier.enabled_count(),
        symbols = symbols.len(),
        "구성 완료"
    );

    let monitor = Arc::new(Monitor::new(provider, analyzer, symbols).with_notifier(notifier));

    match cli.command {
        Commands::Analyze => {
            monitor.trigger_analysis().await;
            print_reports(&monitor).await;
        }
        Commands::Poll => {
            monitor.trigger_analysis().await;
            if let Some(report) = monitor.poll_breakouts().await {
                let mut states: Vec<_> = report.states.into_iter().collect();
                states.sort_by(|a, b| a.0.cmp(&b.0));
                for (symbol, state) in states {
                    let status = if state.is_neutral() {
                        "neutral"
                    } else {
                        state.message.as_str()
                    };
                    println!("{}: {}", symbol, status);
                }
            }
        }
        Commands::Prices => {
            let prices = monitor.current_prices().await;
            let changes = monitor.price_change_24h().await;
            for symbol in monitor.symbols().await {
                let price = prices
                    .get(&symbol.symbol)
                    .copied()
                    .flatten()
                    .map_or_else(|| "N/A".to_string(), |p| p.normalize().to_string());
                let change = changes
                    .get(&symbol.symbol)
                    .copied()
                    .flatten()
                    .map_or_else(
                        || "N/A".to_string(),
                        |c| {
                            if c.is_sign_positive() {
                                format!("+{}%", c)
                            } else {
                                format!("{}%", c)
                            }
                        },
                    );
                println!("{}: {} (24h {})", symbol, price, change);
            }
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (분석 주기: {}초, 감시 주기: {}초) ===",
                config.schedule.analysis_interval_secs,
                config.schedule.breakout_poll_secs
            );

            let shutdown = CancellationToken::new();
            let handle = Scheduler::new(Arc::clone(&monitor), &config.schedule)
                .start(shutdown.clone());

            tokio::signal::ctrl_c().await?;
            tracing::info!("종료 신호 수신, 데몬 종료 중...");
            shutdown.cancel();
            handle.await?;
        }
    }

    tracing::info!("Chartwatch Monitor 종료");
    Ok(())
}

fn parse_symbols(list: &str) -> anyhow::Result<Vec<WatchSymbol>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<WatchSymbol>().map_err(anyhow::Error::from))
        .collect()
}

fn build_provider(
    config: &AppConfig,
    simulated: bool,
    symbols: &[WatchSymbol],
) -> anyhow::Result<Arc<dyn MarketDataProvider>> {
    if simulated {
        let analysis = &config.analysis;
        let mut timeframes: Vec<Timeframe> = Vec::new();
        let wanted = [analysis.primary_timeframe, analysis.candle_timeframe, Timeframe::H1];
        for tf in wanted.iter().chain(&analysis.confluence_timeframes) {
            if !timeframes.contains(tf) {
                timeframes.push(*tf);
            }
        }
        let bars = analysis.primary_bars.max(analysis.candle_bars);
        tracing::warn!("시뮬레이션 시세 사용 (실거래 데이터 아님)");
        return Ok(Arc::new(StaticProvider::random_walk(symbols, &timeframes, bars)));
    }

    let binance = BinanceMarketData::new(BinanceConfig::from_settings(&config.provider))?;
    let policy = RetryPolicy::from_settings(&config.provider);
    Ok(Arc::new(RetryingProvider::new(binance, policy)))
}

#[cfg(not(feature = "ml"))]
fn build_analyzer(_cli: &Cli, config: &AppConfig) -> anyhow::Result<Analyzer> {
    Ok(Analyzer::from_config(&config.analysis)?)
}

#[cfg(feature = "ml")]
fn build_analyzer(cli: &Cli, config: &AppConfig) -> anyhow::Result<Analyzer> {
    use chartwatch_analytics::ml::{OnnxPatternScorer, OnnxScorerConfig};

    match &cli.model {
        Some(path) => {
            let scorer = OnnxPatternScorer::load(OnnxScorerConfig::new(path.clone()))?;
            tracing::info!(model = %path.display(), "패턴 스코어러 로드");
            Ok(Analyzer::with_scorer(&config.analysis, Arc::new(scorer))?)
        }
        None => Ok(Analyzer::from_config(&config.analysis)?),
    }
}

async fn print_reports(monitor: &Monitor) {
    let generation = monitor.snapshot().await;
    for symbol in monitor.symbols().await {
        match generation.report(&symbol.symbol) {
            Some(report) => println!("{}\n", report.summary()),
            None => println!("[{}] 결과 없음\n", symbol),
        }
    }
    if let Some(at) = generation.last_updated {
        println!("Last updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}
