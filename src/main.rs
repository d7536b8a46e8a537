//! fuzzy-signal
//!
//! Command-line interface for fuzzy trading signals.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use fuzzy_signal::{
    Axis, DecisionSurface, InferenceEngine, MarketIndicators, RuleBase, Signal, SignalConfig,
    SignalTally,
};

#[derive(Parser)]
#[command(name = "fuzzy-signal")]
#[command(version = env!("FUZZY_SIGNAL_VERSION"))]
#[command(long_version = concat!(env!("FUZZY_SIGNAL_VERSION"), " (", env!("FUZZY_SIGNAL_TARGET"), ")"))]
#[command(about = "Mamdani fuzzy inference for Buy/Hold/Sell signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to the standard search path)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Rule base: momentum, contrarian, trend-surface
    #[arg(long, global = true, value_name = "NAME")]
    rule_base: Option<String>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate one set of indicators
    Evaluate {
        /// Percent price change
        #[arg(long, allow_hyphen_values = true)]
        price_change: Option<f64>,
        /// Percent volume change
        #[arg(long, allow_hyphen_values = true)]
        volume_change: Option<f64>,
        /// Relative strength index
        #[arg(long, allow_hyphen_values = true)]
        rsi: Option<f64>,
        /// Moving-average trend
        #[arg(long, allow_hyphen_values = true)]
        ma_trend: Option<f64>,
    },
    /// Evaluate rows of `price_change volume_change rsi ma_trend`
    Batch {
        /// Input file (defaults to stdin)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Sample the crisp output over two indicators
    Surface {
        #[arg(long, default_value = "rsi")]
        x: String,
        #[arg(long, default_value = "ma_trend")]
        y: String,
        /// Grid points per axis
        #[arg(long, default_value = "11")]
        points: usize,
    },
    /// List the rules of the configured rule base
    Rules,
    /// Print the effective configuration
    Config {
        /// Print the commented default configuration instead
        #[arg(long)]
        default: bool,
        /// Write the effective configuration to a file
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = SignalConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            config.apply_env_overrides()?;
            config
        }
        None => SignalConfig::load().context("Failed to load config")?,
    };

    if let Some(name) = &cli.rule_base {
        config.engine.rule_base = RuleBase::parse(name)?;
    }

    init_logging(&config, cli.verbose, cli.quiet);
    debug!(rule_base = %config.engine.rule_base, "configuration loaded");

    match cli.command {
        Command::Evaluate {
            price_change,
            volume_change,
            rsi,
            ma_trend,
        } => {
            let engine = config.build_engine()?;
            let indicators = MarketIndicators {
                price_change,
                volume_change,
                rsi,
                ma_trend,
            };
            run_evaluate(&engine, &config, &indicators, cli.json)
        }
        Command::Batch { input } => {
            let engine = config.build_engine()?;
            run_batch(&engine, &config, input, cli.json)
        }
        Command::Surface { x, y, points } => {
            let engine = config.build_engine()?;
            run_surface(&engine, &config, &x, &y, points, cli.json)
        }
        Command::Rules => run_rules(&config, cli.json),
        Command::Config { default, save } => run_config(&config, default, save),
    }
}

fn init_logging(config: &SignalConfig, verbose: u8, quiet: u8) {
    let level = config.general.log_level.adjusted(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn write_stdout(content: &str) -> Result<()> {
    io::stdout()
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")
}

// ============================================================================
// Commands
// ============================================================================

fn run_evaluate(
    engine: &InferenceEngine,
    config: &SignalConfig,
    indicators: &MarketIndicators,
    as_json: bool,
) -> Result<()> {
    let inputs = indicators.to_inputs(&config.defaults);

    let output = match engine.evaluate_and_label(&inputs) {
        Ok(decision) if as_json => serde_json::to_string_pretty(&decision)? + "\n",
        Ok(decision) => {
            let mut out = format!("{} ({:+.4})\n", decision.signal, decision.crisp_value);
            for firing in decision.rule_firings.iter().filter(|f| f.strength > 0.0) {
                out.push_str(&format!(
                    "  {:.3}  {}\n",
                    firing.strength,
                    engine.rules()[firing.index]
                ));
            }
            out
        }
        Err(e) if as_json => serde_json::to_string_pretty(&e.report())? + "\n",
        Err(e) => bail!(e),
    };

    write_stdout(&output)
}

fn run_batch(
    engine: &InferenceEngine,
    config: &SignalConfig,
    input: Option<PathBuf>,
    as_json: bool,
) -> Result<()> {
    let content = match &input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?,
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read from stdin")?;
            content
        }
    };

    let rows = parse_rows(&content)?;
    let inputs: Vec<_> = rows
        .iter()
        .map(|(_, indicators)| indicators.to_inputs(&config.defaults))
        .collect();
    let results = engine.evaluate_batch(&inputs);
    let tally: SignalTally = results.iter().collect();
    info!(rows = rows.len(), errors = tally.errors, "batch complete");

    let output = if as_json {
        let rows: Vec<_> = rows
            .iter()
            .zip(&results)
            .map(|((line, _), result)| match result {
                Ok(decision) => json!({
                    "line": line,
                    "signal": decision.signal,
                    "crisp_value": decision.crisp_value,
                }),
                Err(e) => json!({ "line": line, "error": e.report() }),
            })
            .collect();
        serde_json::to_string_pretty(&json!({ "rows": rows, "tally": tally }))? + "\n"
    } else {
        let mut out = String::new();
        for ((line, _), result) in rows.iter().zip(&results) {
            match result {
                Ok(decision) => {
                    out.push_str(&format!("{line}\t{}\t{:+.4}\n", decision.signal, decision.crisp_value))
                }
                Err(e) => out.push_str(&format!("{line}\terror\t{e}\n")),
            }
        }
        out.push_str(&format!(
            "\nbuy {} ({:.1}%)  hold {} ({:.1}%)  sell {} ({:.1}%)  errors {}\n",
            tally.buy,
            tally.share(Signal::Buy),
            tally.hold,
            tally.share(Signal::Hold),
            tally.sell,
            tally.share(Signal::Sell),
            tally.errors,
        ));
        out
    };

    write_stdout(&output)
}

fn run_surface(
    engine: &InferenceEngine,
    config: &SignalConfig,
    x: &str,
    y: &str,
    points: usize,
    as_json: bool,
) -> Result<()> {
    if points < 2 {
        bail!("--points must be at least 2");
    }
    let axis = |name: &str| -> Result<Axis> {
        let var = engine
            .input(name)
            .with_context(|| format!("unknown input variable: {name}"))?;
        let (min, max) = var.universe();
        Ok(Axis::new(name, min, max, (max - min) / (points - 1) as f64))
    };
    let (x_axis, y_axis) = (axis(x)?, axis(y)?);

    // Non-swept inputs sit at their configured default or mid-universe
    let mut base = MarketIndicators::default().to_inputs(&config.defaults);
    for var in engine.inputs() {
        base.entry(var.name().to_string()).or_insert_with(|| var.midpoint());
    }

    let surface = DecisionSurface::sample(engine, &base, &x_axis, &y_axis);

    let output = if as_json {
        serde_json::to_string_pretty(&surface)? + "\n"
    } else {
        let mut out = format!("{}\\{}", surface.y_variable, surface.x_variable);
        for xv in &surface.x {
            out.push_str(&format!("\t{xv:.2}"));
        }
        out.push('\n');
        for (yv, row) in surface.y.iter().zip(&surface.z) {
            out.push_str(&format!("{yv:.2}"));
            for cell in row {
                match cell {
                    Some(v) => out.push_str(&format!("\t{v:+.3}")),
                    None => out.push_str("\t-"),
                }
            }
            out.push('\n');
        }
        out
    };

    write_stdout(&output)
}

fn run_rules(config: &SignalConfig, as_json: bool) -> Result<()> {
    let rule_base = config.engine.rule_base;
    let rules = rule_base.rules();

    let output = if as_json {
        serde_json::to_string_pretty(&json!({
            "rule_base": rule_base,
            "description": rule_base.description(),
            "rules": rules,
        }))? + "\n"
    } else {
        let mut out = format!("{rule_base}: {}\n", rule_base.description());
        for (i, rule) in rules.iter().enumerate() {
            out.push_str(&format!("{:>3}. {rule}\n", i + 1));
        }
        out
    };

    write_stdout(&output)
}

fn run_config(config: &SignalConfig, default: bool, save: Option<PathBuf>) -> Result<()> {
    if let Some(path) = save {
        config.save_to_file(&path)?;
        info!(path = %path.display(), "configuration saved");
        return Ok(());
    }

    if default {
        write_stdout(SignalConfig::default_config_content())
    } else {
        write_stdout(&config.to_toml()?)
    }
}

// ============================================================================
// Row input
// ============================================================================

/// Parse indicator rows, one per line.
///
/// Fields are separated by commas or whitespace. Blank lines and lines
/// starting with `#` are skipped. A field of `-` or `na` marks an
/// unavailable indicator.
fn parse_rows(content: &str) -> Result<Vec<(usize, MarketIndicators)>> {
    let mut rows = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() != 4 {
            bail!("line {line_no}: expected 4 fields, found {}", fields.len());
        }

        let mut values = [None; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = match field.to_lowercase().as_str() {
                "-" | "na" | "nan" => None,
                _ => Some(
                    field
                        .parse::<f64>()
                        .with_context(|| format!("line {line_no}: invalid number '{field}'"))?,
                ),
            };
        }

        let [price_change, volume_change, rsi, ma_trend] = values;
        rows.push((
            line_no,
            MarketIndicators {
                price_change,
                volume_change,
                rsi,
                ma_trend,
            },
        ));
    }

    Ok(rows)
}
