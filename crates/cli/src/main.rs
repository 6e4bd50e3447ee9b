// cartcheck CLI - headless basket verification
// Human summaries go to stderr; --json / CSV output goes to stdout.

mod exit_codes;
mod predictions;
mod scan;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use cartcheck_config::{Settings, SettingsError};
use cartcheck_core::{estimate_with_capacity, ChecklistItem, Detection};
use cartcheck_recon::{
    alert_lines, build_report, load_checklist_csv, load_detections_csv, reconcile, to_rows,
    write_report_csv, Detector, ModelDetector, ReconError, ScanReport, SimulatedDetector,
    SimulatorConfig,
};
use cartcheck_recon::detector::InferenceBackend;
use cartcheck_recon::export::REPORT_FILE_NAME;

use exit_codes::{EXIT_CAPTURE, EXIT_IO, EXIT_MISMATCH, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cartcheck")]
#[command(about = "Verify a shopping basket against its checklist")]
#[command(version)]
struct Cli {
    /// TOML settings override (default: settings.json in the user config dir)
    #[arg(long, global = true, env = "CARTCHECK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate how full the basket is from package sizes
    #[command(after_help = "\
Examples:
  cartcheck estimate basket.csv
  cartcheck estimate basket.csv --json")]
    Estimate {
        /// Checklist CSV (id,name,qty[,size])
        checklist: PathBuf,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Reconcile a checklist against recorded detections
    #[command(after_help = "\
Examples:
  cartcheck reconcile basket.csv detections.csv
  cartcheck reconcile basket.csv detections.csv --json
  cartcheck reconcile basket.csv detections.csv --csv basket-scan-report.csv

Exit codes:
  0  all items matched
  1  missing or extra items found")]
    Reconcile {
        /// Checklist CSV (id,name,qty[,size])
        checklist: PathBuf,

        /// Detections CSV (id,name,qty); repeated ids are summed
        detections: PathBuf,

        /// Output the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the CSV report (default file: basket-scan-report.csv)
        #[arg(long, value_name = "OUT", num_args = 0..=1, default_missing_value = REPORT_FILE_NAME)]
        csv: Option<PathBuf>,
    },

    /// Run the simulated detector once and print detections as CSV
    #[command(after_help = "\
Examples:
  cartcheck simulate basket.csv --seed 7 > detections.csv")]
    Simulate {
        /// Checklist CSV (id,name,qty[,size])
        checklist: PathBuf,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a full video-scan session against a virtual camera
    #[command(after_help = "\
Examples:
  cartcheck scan basket.csv
  cartcheck scan basket.csv --seed 7 --json
  cartcheck scan basket.csv --stop-after-ms 1200 --csv
  cartcheck scan basket.csv --predictions model-output.csv")]
    Scan {
        /// Checklist CSV (id,name,qty[,size])
        checklist: PathBuf,

        /// Seed for progress, overlays and detections
        #[arg(long)]
        seed: Option<u64>,

        /// Press stop after this many milliseconds
        #[arg(long, value_name = "MS")]
        stop_after_ms: Option<u64>,

        /// Replay recorded model predictions (label,confidence) instead of
        /// simulating; rows below detector.minConfidence are ignored
        #[arg(long, value_name = "CSV")]
        predictions: Option<PathBuf>,

        /// Capture device to open
        #[arg(long, value_enum, default_value_t = CameraSource::Virtual)]
        camera: CameraSource,

        /// Output the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the CSV report (default file: basket-scan-report.csv)
        #[arg(long, value_name = "OUT", num_args = 0..=1, default_missing_value = REPORT_FILE_NAME)]
        csv: Option<PathBuf>,
    },

    /// Inspect or reset the user settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the settings file location
    Path,

    /// Print the effective settings as JSON
    Show,

    /// Overwrite the settings file with defaults
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CameraSource {
    /// In-process camera that always opens
    Virtual,
    /// No camera attached; scans fail to start
    #[value(name = "none")]
    Absent,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = load_settings(cli.config.as_deref()).and_then(|settings| match cli.command {
        Commands::Estimate { checklist, json } => cmd_estimate(&settings, &checklist, json),
        Commands::Reconcile { checklist, detections, json, csv } => {
            cmd_reconcile(&settings, &checklist, &detections, json, csv)
        }
        Commands::Simulate { checklist, seed } => cmd_simulate(&settings, &checklist, seed),
        Commands::Scan { checklist, seed, stop_after_ms, predictions, camera, json, csv } => {
            let opts = scan::ScanOptions { seed, stop_after_ms, predictions, camera, json, csv };
            scan::cmd_scan(&settings, &checklist, opts)
        }
        Commands::Config { command } => cmd_config(&settings, command),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CAPTURE, message: msg.into(), hint: None }
    }

    /// Not an error as such: the basket did not match. The summary is already printed.
    pub fn mismatch() -> Self {
        Self { code: EXIT_MISMATCH, message: String::new(), hint: None }
    }

    pub fn recon(path: &Path, err: ReconError) -> Self {
        match err {
            ReconError::Io(msg) => Self::io(format!("{}: {msg}", path.display())),
            ReconError::MissingColumn { .. } => Self::parse(format!("{}: {err}", path.display()))
                .with_hint("checklists need id,name,qty[,size]; detections need id,name,qty"),
            other => Self::parse(format!("{}: {other}", path.display())),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Io(_) => Self::io(err.to_string()),
            SettingsError::Parse(_) => Self::parse(err.to_string()),
            SettingsError::Invalid { .. } => Self::usage(err.to_string()),
        }
    }
}

// ============================================================================
// shared helpers
// ============================================================================

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    let Some(path) = path else {
        return Ok(Settings::load());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    let settings = Settings::from_toml(&text)
        .map_err(|e| CliError::from(e).with_hint(format!("check {}", path.display())))?;
    log::debug!("loaded settings from {}", path.display());
    Ok(settings)
}

pub(crate) fn read_checklist(path: &Path) -> Result<Vec<ChecklistItem>, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    load_checklist_csv(&text).map_err(|e| CliError::recon(path, e))
}

fn read_detections(path: &Path) -> Result<Vec<Detection>, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    load_detections_csv(&text).map_err(|e| CliError::recon(path, e))
}

pub(crate) fn simulator_config(settings: &Settings) -> SimulatorConfig {
    SimulatorConfig {
        miss_probability: settings.miss_probability,
        extra_probability: settings.extra_probability,
    }
}

/// Build the model-backed detector with the configured confidence floor.
pub(crate) fn model_detector<B: InferenceBackend>(
    settings: &Settings,
    backend: B,
) -> ModelDetector<B> {
    ModelDetector::new(backend, settings.min_confidence)
}

/// Print the summary to stderr, then write JSON / CSV outputs as requested.
pub(crate) fn emit_report(
    report: &ScanReport,
    settings: &Settings,
    json: bool,
    csv_out: Option<PathBuf>,
) -> Result<(), CliError> {
    let s = &report.summary;
    eprintln!(
        "Scan finished. {}/{} items matched.",
        s.matched_units, s.total_expected
    );
    for line in alert_lines(&report.result) {
        eprintln!("  {line}");
    }
    if let Some(capacity) = &report.capacity {
        if capacity.near_full(settings.near_full_percent) {
            eprintln!("  Basket is {}% full", capacity.fill_percent);
        }
    }

    if let Some(path) = csv_out {
        let file = std::fs::File::create(&path)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        write_report_csv(&to_rows(&report.result), io::BufWriter::new(file))
            .map_err(|e| CliError::recon(&path, e))?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        let json_str = serde_json::to_string_pretty(report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    Ok(())
}

// ============================================================================
// estimate
// ============================================================================

fn cmd_estimate(settings: &Settings, checklist: &Path, json: bool) -> Result<(), CliError> {
    let items = read_checklist(checklist)?;
    let estimate = estimate_with_capacity(&items, settings.capacity_liters);

    if json {
        let json_str = serde_json::to_string_pretty(&estimate)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    let near_full = if estimate.near_full(settings.near_full_percent) {
        " (nearly full)"
    } else {
        ""
    };
    eprintln!(
        "{:.2} L of {} L used: {}%{near_full}",
        estimate.used_liters, estimate.capacity_liters, estimate.fill_percent
    );
    Ok(())
}

// ============================================================================
// reconcile
// ============================================================================

fn cmd_reconcile(
    settings: &Settings,
    checklist_path: &Path,
    detections_path: &Path,
    json: bool,
    csv_out: Option<PathBuf>,
) -> Result<(), CliError> {
    let checklist = read_checklist(checklist_path)?;
    let detections = read_detections(detections_path)?;

    let result = reconcile(&checklist, &detections);
    let capacity = estimate_with_capacity(&checklist, settings.capacity_liters);
    let report = build_report(&checklist, &detections, result, Some(capacity));

    emit_report(&report, settings, json, csv_out)?;

    if report.summary.all_matched {
        Ok(())
    } else {
        Err(CliError::mismatch())
    }
}

// ============================================================================
// simulate
// ============================================================================

fn cmd_simulate(settings: &Settings, checklist: &Path, seed: Option<u64>) -> Result<(), CliError> {
    let items = read_checklist(checklist)?;
    let config = simulator_config(settings);
    let detector = match seed.or(settings.seed) {
        Some(seed) => SimulatedDetector::seeded(config, seed),
        None => SimulatedDetector::new(config),
    };
    let detections = detector.detect(&items);

    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    for detection in &detections {
        wtr.serialize(detection)
            .map_err(|e| CliError::io(e.to_string()))?;
    }
    if detections.is_empty() {
        wtr.write_record(["id", "name", "qty"])
            .map_err(|e| CliError::io(e.to_string()))?;
    }
    wtr.flush().map_err(|e| CliError::io(e.to_string()))?;
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(settings: &Settings, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", Settings::config_path_display());
        }
        ConfigCommands::Show => {
            let json_str = serde_json::to_string_pretty(settings)
                .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
            println!("{json_str}");
        }
        ConfigCommands::Reset => {
            Settings::default().save()?;
            eprintln!("wrote {}", Settings::config_path_display());
        }
    }
    Ok(())
}
