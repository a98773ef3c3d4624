use analytics::{
    AnalyticsEngine, CalendarUnit, GroupDimension, Reducer, TradeFlags, Window,
};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};
use core_types::Trade;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Performance analytics for a trade journal CSV.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file; missing file means defaults.
    #[arg(long, default_value = "config.toml", global = true)]
    config: String,

    /// Emit JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Whole-journal performance summary.
    Summary { file: PathBuf },

    /// Group statistics along one dimension, with significance testing.
    Groups {
        file: PathBuf,
        /// The grouping dimension.
        #[arg(long, value_enum)]
        by: DimensionArg,
    },

    /// Setup-type statistics with keep/stop recommendations.
    Setups { file: PathBuf },

    /// Rolling statistic at every trade position.
    Rolling {
        file: PathBuf,
        /// Trailing window: a trade count ("20") or "day", "week", "month".
        /// Defaults to the configured rolling window sizes.
        #[arg(long)]
        window: Option<String>,
        #[arg(long, value_enum)]
        reducer: ReducerArg,
        /// Compute per setup type instead of over the whole sequence.
        #[arg(long)]
        per_setup: bool,
    },

    /// Equity curve extremes, drawdown periods, and recovery statistics.
    Drawdown { file: PathBuf },

    /// Statistically or behaviorally anomalous trades.
    Outliers { file: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DimensionArg {
    Setup,
    Session,
    Instrument,
    Hour,
    Weekday,
    Month,
    Year,
    Quarter,
    SetupSession,
}

impl From<DimensionArg> for GroupDimension {
    fn from(arg: DimensionArg) -> Self {
        match arg {
            DimensionArg::Setup => GroupDimension::SetupType,
            DimensionArg::Session => GroupDimension::Session,
            DimensionArg::Instrument => GroupDimension::Instrument,
            DimensionArg::Hour => GroupDimension::Hour,
            DimensionArg::Weekday => GroupDimension::DayOfWeek,
            DimensionArg::Month => GroupDimension::Month,
            DimensionArg::Year => GroupDimension::Year,
            DimensionArg::Quarter => GroupDimension::Quarter,
            DimensionArg::SetupSession => GroupDimension::SetupSession,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReducerArg {
    WinRate,
    Sum,
    Mean,
    Stdev,
}

impl From<ReducerArg> for Reducer {
    fn from(arg: ReducerArg) -> Self {
        match arg {
            ReducerArg::WinRate => Reducer::WinRate,
            ReducerArg::Sum => Reducer::SumPnl,
            ReducerArg::Mean => Reducer::MeanPnl,
            ReducerArg::Stdev => Reducer::StdevPnl,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = configuration::load_config(&cli.config)
        .with_context(|| format!("invalid configuration in '{}'", cli.config))?;
    let engine = AnalyticsEngine::new(config)?;

    match &cli.command {
        Commands::Summary { file } => {
            let trades = load(file)?;
            let report = engine.summarize(&trades);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }
        }
        Commands::Groups { file, by } => {
            let trades = load(file)?;
            let reports = engine.group_stats(&trades, (*by).into());
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print_groups(&reports, None);
            }
        }
        Commands::Setups { file } => {
            let trades = load(file)?;
            let reviews = engine.setup_reviews(&trades);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reviews)?);
            } else {
                let reports: Vec<_> = reviews.iter().map(|r| r.report.clone()).collect();
                let recommendations: Vec<String> = reviews
                    .iter()
                    .map(|r| r.recommendation.to_string())
                    .collect();
                print_groups(&reports, Some(&recommendations));
            }
        }
        Commands::Rolling {
            file,
            window,
            reducer,
            per_setup,
        } => {
            let trades = load(file)?;
            let windows: Vec<(String, Window)> = match window {
                Some(spec) => vec![(spec.clone(), parse_window(spec)?)],
                None => engine
                    .config()
                    .rolling_windows
                    .iter()
                    .map(|&w| (w.to_string(), Window::Trades(w)))
                    .collect(),
            };

            let mut series: Vec<(String, Vec<Option<Decimal>>)> = Vec::new();
            for (label, window) in windows {
                let values = if *per_setup {
                    engine.rolling_partitioned(
                        &trades,
                        |t| t.setup_type.clone(),
                        window,
                        (*reducer).into(),
                    )?
                } else {
                    engine.rolling(&trades, window, (*reducer).into())?
                };
                series.push((label, values));
            }

            if cli.json {
                let output: serde_json::Map<String, serde_json::Value> = series
                    .into_iter()
                    .map(|(label, values)| Ok((label, serde_json::to_value(values)?)))
                    .collect::<Result<_, serde_json::Error>>()?;
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_rolling(&trades, &series);
            }
        }
        Commands::Drawdown { file } => {
            let trades = load(file)?;
            if cli.json {
                let output = serde_json::json!({
                    "equity_curve": engine.equity_curve(&trades),
                    "drawdown_periods": engine.drawdown_periods(&trades),
                    "recovery": engine.recovery_stats(&trades),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_drawdown(&trades, &engine);
            }
        }
        Commands::Outliers { file } => {
            let trades = load(file)?;
            let flags = engine.detect_outliers(&trades);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&flags)?);
            } else {
                print_outliers(&flags);
            }
        }
    }

    Ok(())
}

fn load(file: &PathBuf) -> anyhow::Result<Vec<Trade>> {
    let trades = dataset::load(file)
        .with_context(|| format!("failed to load trade log '{}'", file.display()))?;
    info!(count = trades.len(), file = %file.display(), "trade log loaded");
    Ok(trades)
}

fn parse_window(spec: &str) -> anyhow::Result<Window> {
    let window = match spec {
        "day" => Window::Calendar(CalendarUnit::Day),
        "week" => Window::Calendar(CalendarUnit::Week),
        "month" => Window::Calendar(CalendarUnit::Month),
        other => {
            let n: usize = other.parse().with_context(|| {
                format!("window must be a trade count or day/week/month, got '{}'", other)
            })?;
            Window::Trades(n)
        }
    };
    Ok(window)
}

fn fmt_opt(value: Option<Decimal>, dp: u32) -> String {
    match value {
        Some(v) => v.round_dp(dp).to_string(),
        None => "n/a".to_string(),
    }
}

fn print_summary(report: &analytics::PerformanceReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);

    let rows: Vec<(&str, String)> = vec![
        ("Total trades", report.total_trades.to_string()),
        ("Wins", report.winning_trades.to_string()),
        ("Losses", report.losing_trades.to_string()),
        ("Win rate (%)", fmt_opt(report.win_rate_pct, 2)),
        ("Total P&L", report.total_net_pnl.round_dp(2).to_string()),
        ("Average P&L", fmt_opt(report.average_pnl, 2)),
        ("Average win", fmt_opt(report.average_win, 2)),
        ("Average loss", fmt_opt(report.average_loss, 2)),
        ("Profit factor", fmt_opt(report.profit_factor, 2)),
        ("Expectancy", fmt_opt(report.expectancy, 2)),
        ("P&L std dev", fmt_opt(report.pnl_std_dev, 2)),
        ("Sharpe-like ratio", fmt_opt(report.sharpe_like, 2)),
        ("Max drawdown", report.max_drawdown.round_dp(2).to_string()),
        (
            "Max drawdown (%)",
            report.max_drawdown_pct.round_dp(2).to_string(),
        ),
        ("Avg drawdown (%)", fmt_opt(report.average_drawdown_pct, 2)),
        ("Final balance", report.final_balance.round_dp(2).to_string()),
        (
            "Max consecutive wins",
            report.max_consecutive_wins.to_string(),
        ),
        (
            "Max consecutive losses",
            report.max_consecutive_losses.to_string(),
        ),
        (
            "Potential revenge trades",
            report.revenge_trade_count.to_string(),
        ),
        (
            "Risk escalation events",
            report.risk_escalation_count.to_string(),
        ),
        ("Trading span (days)", report.trading_span_days.to_string()),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    println!("{table}");
}

fn print_groups(reports: &[analytics::GroupReport], recommendations: Option<&[String]>) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut header = vec![
        "Group", "Trades", "Wins", "Losses", "Win rate %", "Total P&L", "Avg P&L",
        "Profit factor", "Sharpe", "Z-score", "Significance",
    ];
    if recommendations.is_some() {
        header.push("Recommendation");
    }
    table.set_header(header);

    for (i, report) in reports.iter().enumerate() {
        let s = &report.stats;
        let mut row = vec![
            s.key.clone(),
            s.total.to_string(),
            s.wins.to_string(),
            s.losses.to_string(),
            s.win_rate_pct.to_string(),
            s.total_pnl.round_dp(2).to_string(),
            s.avg_pnl.round_dp(2).to_string(),
            fmt_opt(s.profit_factor, 2),
            fmt_opt(s.sharpe_like, 2),
            fmt_opt(report.z_score, 2),
            report.significance.to_string(),
        ];
        if let Some(recs) = recommendations {
            row.push(recs[i].clone());
        }
        table.add_row(row);
    }
    println!("{table}");
}

fn print_rolling(trades: &[Trade], series: &[(String, Vec<Option<Decimal>>)]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut header = vec![
        "Trade".to_string(),
        "Date".to_string(),
        "Setup".to_string(),
        "P&L".to_string(),
    ];
    for (label, _) in series {
        header.push(format!("w={}", label));
    }
    table.set_header(header);

    for (i, trade) in trades.iter().enumerate() {
        let mut row = vec![
            trade.trade_id.to_string(),
            trade.date.to_string(),
            trade.setup_type.clone(),
            trade.pnl.round_dp(2).to_string(),
        ];
        for (_, values) in series {
            row.push(fmt_opt(values[i], 4));
        }
        table.add_row(row);
    }
    println!("{table}");
}

fn print_drawdown(trades: &[Trade], engine: &AnalyticsEngine) {
    let curve = engine.equity_curve(trades);
    if let Some(last) = curve.last() {
        println!(
            "Final balance: {}  peak: {}",
            last.balance.round_dp(2),
            last.peak_balance.round_dp(2)
        );
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "From trade", "To trade", "Trades", "Days", "Trough balance", "Max drawdown %",
    ]);
    for period in engine.drawdown_periods(trades) {
        table.add_row(vec![
            period.start_trade_id.to_string(),
            period.end_trade_id.to_string(),
            period.trade_count.to_string(),
            period.calendar_days.to_string(),
            period.trough_balance.round_dp(2).to_string(),
            period.max_drawdown_pct.round_dp(2).to_string(),
        ]);
    }
    println!("{table}");

    match engine.recovery_stats(trades) {
        Some(recovery) => println!(
            "New highs: {}  days between highs avg/min/max: {}/{}/{}",
            recovery.new_high_count,
            recovery.avg_days_between_highs.round_dp(1),
            recovery.min_days_between_highs,
            recovery.max_days_between_highs
        ),
        None => println!("Recovery statistics: insufficient new highs"),
    }
}

fn print_outliers(flags: &[TradeFlags]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Trade", "P&L z-score", "Z-score outlier", "IQR outlier", "Revenge", "Risk escalation",
    ]);
    let mut any = false;
    for flag in flags {
        if !(flag.zscore_outlier || flag.iqr_outlier || flag.revenge_trade || flag.risk_escalation)
        {
            continue;
        }
        any = true;
        table.add_row(vec![
            flag.trade_id.to_string(),
            fmt_opt(flag.pnl_zscore, 2),
            flag.zscore_outlier.to_string(),
            flag.iqr_outlier.to_string(),
            flag.revenge_trade.to_string(),
            flag.risk_escalation.to_string(),
        ]);
    }
    if any {
        println!("{table}");
    } else {
        println!("No outliers detected");
    }
}
