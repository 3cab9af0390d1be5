mod logic;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use env_logger::Env;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use logic::{SimulationConfig, SimulationRecord, resolve_seed_inputs, run_simulation, summarize};
use relic_engine::{
    AcquisitionConfig, DatabaseVariant, LoadWarning, UnlockDatabase, UnlockRegistry,
};
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored human-readable summary
    Console,
    /// Pretty-printed JSON with every run and the summary
    Json,
    /// Markdown tables
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "relic-sim", version)]
#[command(about = "Simulate relic acquisition and unlock activation over seeded gameplay streams")]
struct Args {
    /// Seeds to run (comma-separated; decimal, 0x hex, or inclusive a..b ranges)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Gameplay signals generated per seed
    #[arg(long, default_value_t = 5000)]
    events: usize,

    /// Unlock database JSON to load instead of the bundled one
    #[arg(long)]
    definitions: Option<PathBuf>,

    /// Acquisition tuning JSON (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable success-rate scaling by available unlock count
    #[arg(long)]
    no_scaling: bool,

    /// Drop members-only unlocks
    #[arg(long)]
    f2p: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let start_time = Instant::now();
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let (registry, warnings) = load_registry(args.definitions.as_deref(), args.f2p)?;
    report_warnings(&warnings);
    let acquisition = load_acquisition_config(args.config.as_deref(), args.no_scaling)?;

    if args.report == ReportFormat::Console {
        announce_banner(registry.len(), seeds.len());
    }

    let records: Vec<SimulationRecord> = seeds
        .iter()
        .map(|&seed| {
            log::debug!("simulating seed {seed} for {} events", args.events);
            run_simulation(&registry, &acquisition, SimulationConfig::new(seed, args.events))
        })
        .collect();

    write_report(&args, &records, start_time)
}

fn announce_banner(unlocks: usize, seeds: usize) {
    println!("{}", "🏺 Relic Progression Simulator".bright_cyan().bold());
    println!("{}", "================================".cyan());
    println!("{unlocks} unlocks loaded, {seeds} seed(s) queued");
}

fn load_registry(path: Option<&Path>, f2p: bool) -> Result<(UnlockRegistry, Vec<LoadWarning>)> {
    let database = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let database = UnlockDatabase::from_json(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            if f2p { database.free_to_play() } else { database }
        }
        None => {
            let variant = if f2p {
                DatabaseVariant::FreeToPlay
            } else {
                DatabaseVariant::Full
            };
            UnlockDatabase::load_from_static(variant)
        }
    };
    Ok(UnlockRegistry::load(database.into_records()))
}

fn report_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        eprintln!("⚠️  {}", warning.to_string().yellow());
    }
}

fn load_acquisition_config(path: Option<&Path>, no_scaling: bool) -> Result<AcquisitionConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<AcquisitionConfig>(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => AcquisitionConfig::default(),
    };
    if no_scaling {
        config.scaling_enabled = false;
    }
    config
        .validate()
        .context("acquisition config is invalid")?;
    Ok(config)
}

fn write_report(args: &Args, records: &[SimulationRecord], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let summary = summarize(records);

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(output_target.writer(), records, &summary)?;
        }
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(output_target.writer(), records, &summary)?;
        }
        ReportFormat::Console => {
            logic::reports::generate_console_report(
                output_target.writer(),
                records,
                &summary,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
