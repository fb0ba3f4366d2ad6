//! The batch driver behind the `epitrace` binary: loads controls and an optional scenario,
//! runs the requested number of samples, and writes the `daily` and `cumulative` reports.
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use crate::controls::Controls;
use crate::define_report;
use crate::error::SimError;
use crate::log::apply_log_spec;
use crate::report::{ReportOptions, Reports};
use crate::scenario::Scenario;
use crate::simulation::{DaySummary, Simulation};
use crate::stats::{RunStats, StatKind, DEFAULT_MAX_DAYS, DEFAULT_MAX_SAMPLES};

pub const DEFAULT_RUN_DAYS: usize = 200;

/// Default cli arguments for the epitrace runner
#[derive(Parser, Debug, Clone)]
#[command(name = "epitrace", version, about)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path for a JSON controls file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional path for a JSON scenario script
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,

    /// Directory for report output
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Prefix for report file names
    #[arg(long, default_value = "")]
    pub file_prefix: String,

    /// Replace existing report files
    #[arg(long)]
    pub overwrite: bool,

    /// Number of samples to run
    #[arg(short = 'n', long, default_value_t = 1)]
    pub samples: usize,

    /// Last day of every sample
    #[arg(short, long, default_value_t = DEFAULT_RUN_DAYS)]
    pub max_days: usize,

    /// Log level, e.g. `info` or `epitrace::network=trace`
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Default for BaseArgs {
    fn default() -> Self {
        BaseArgs {
            random_seed: 0,
            config: None,
            scenario: None,
            output_dir: PathBuf::from("."),
            file_prefix: String::new(),
            overwrite: false,
            samples: 1,
            max_days: DEFAULT_RUN_DAYS,
            log_level: None,
        }
    }
}

/// One row per sample and day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyReportItem {
    pub sample: usize,
    pub day: usize,
    pub newly_infected: usize,
    pub non_isolated_infected: usize,
    pub isolated_by_symptom: usize,
    pub isolated_by_watch: usize,
    pub recovered_or_dead: usize,
    pub non_infected: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}
define_report!(DailyReportItem, "daily");

/// One row per day and statistic: the cumulative mean over all samples of the run.
#[derive(Debug, Clone, Serialize)]
pub struct CumulativeReportItem {
    pub day: usize,
    pub kind: StatKind,
    pub mean: f64,
}
define_report!(CumulativeReportItem, "cumulative");

/// The outcome of [`run_with_args`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub title: String,
    /// Last simulated day of each sample.
    pub last_days: Vec<usize>,
    /// Everyone infected in each sample, seeds included.
    pub total_infected: Vec<usize>,
    pub daily_report: PathBuf,
    pub cumulative_report: PathBuf,
}

fn daily_row(simulation: &Simulation, sample: usize, day: usize) -> Result<DailyReportItem, SimError> {
    let counts = simulation.daily_counts(day)?;
    let status = simulation.status_counts();
    Ok(DailyReportItem {
        sample,
        day,
        newly_infected: counts.newly_infected,
        non_isolated_infected: counts.non_isolated_infected,
        isolated_by_symptom: counts.isolated_by_symptom,
        isolated_by_watch: counts.isolated_by_watch,
        recovered_or_dead: counts.recovered_or_dead,
        non_infected: status.non_infected,
        infected: status.infected,
        recovered: status.recovered,
        dead: status.dead,
    })
}

/// Runs a batch from parsed arguments.
///
/// # Errors
/// Returns an error if the controls or scenario fail to load or validate, or if a report
/// cannot be written.
pub fn run_with_args(args: &BaseArgs) -> Result<RunSummary, SimError> {
    if let Some(spec) = &args.log_level {
        apply_log_spec(spec)?;
    }

    let base = match &args.config {
        Some(path) => {
            println!("Loading controls from: {}", path.display());
            Controls::from_json_file(path)?
        }
        None => Controls::default(),
    };
    let scenario = match &args.scenario {
        Some(path) => {
            println!("Loading scenario from: {}", path.display());
            Some(Scenario::from_json_file(path)?)
        }
        None => None,
    };
    let title = scenario
        .as_ref()
        .map_or_else(|| "default".to_string(), |scenario| scenario.title.clone());

    let samples = args.samples.clamp(1, DEFAULT_MAX_SAMPLES);
    if samples != args.samples {
        warn!(
            "running {samples} samples instead of {}: the statistics store holds {DEFAULT_MAX_SAMPLES}",
            args.samples
        );
    }
    let mut max_days = args.max_days.min(DEFAULT_MAX_DAYS - 1);
    if max_days != args.max_days {
        warn!(
            "stopping samples at day {max_days}: the statistics store holds {DEFAULT_MAX_DAYS} days"
        );
    }
    if let Some(scenario) = &scenario {
        max_days = max_days.min(scenario.total_days());
    }

    let mut options = ReportOptions::default();
    options
        .directory(&args.output_dir)
        .file_prefix(&args.file_prefix)
        .overwrite(args.overwrite);
    let mut reports = Reports::new(options);
    let daily_report = reports.add_report::<DailyReportItem>()?;
    let cumulative_report = reports.add_report::<CumulativeReportItem>()?;

    let phase_controls = |phase: usize| match &scenario {
        Some(scenario) => scenario.controls_for_phase(&base, phase),
        None => Ok(base.clone()),
    };

    let mut simulation = Simulation::new(phase_controls(0)?, args.random_seed)?;
    let mut last_days = Vec::with_capacity(samples);
    let mut total_infected = Vec::with_capacity(samples);

    for sample in 0..samples {
        if sample > 0 {
            simulation.set_controls(phase_controls(0)?)?;
            simulation.reset()?;
        }
        reports.send_report(&daily_row(&simulation, sample, 0)?)?;

        let mut phase = 0;
        let mut last_day = 0;
        for day in 1..=max_days {
            if let Some(scenario) = &scenario {
                match scenario.phase_at(day) {
                    Some(next) if next != phase => {
                        phase = next;
                        info!("sample {sample}: entering phase {phase} on day {day}");
                        simulation.set_controls(phase_controls(phase)?)?;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            let summary: DaySummary = simulation.step(day)?;
            reports.send_report(&daily_row(&simulation, sample, day)?)?;
            last_day = day;
            if summary.counts.infected == 0 {
                break;
            }
        }

        info!(
            "sample {sample} finished on day {last_day}: {} infected in total",
            simulation.total_infected()
        );
        last_days.push(last_day);
        total_infected.push(simulation.total_infected());
    }

    let through_day = last_days.iter().copied().max().unwrap_or(0);
    write_cumulative(&mut reports, simulation.stats(), samples - 1, through_day)?;
    reports.flush()?;

    Ok(RunSummary {
        title,
        last_days,
        total_infected,
        daily_report,
        cumulative_report,
    })
}

fn write_cumulative(
    reports: &mut Reports,
    stats: &RunStats,
    last_sample: usize,
    through_day: usize,
) -> Result<(), SimError> {
    let series: Vec<(StatKind, Vec<f64>)> = RunStats::kinds()
        .map(|kind| Ok((kind, stats.cumulative_mean_series(kind, last_sample, through_day)?)))
        .collect::<Result<_, SimError>>()?;
    for day in 0..=through_day {
        for (kind, means) in &series {
            reports.send_report(&CumulativeReportItem {
                day,
                kind: *kind,
                mean: means[day],
            })?;
        }
    }
    Ok(())
}
