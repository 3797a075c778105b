// src/main.rs - wallplot command line
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use wallplot_rs::config::{self, Config};
use wallplot_rs::file_manager::FileManager;
use wallplot_rs::hardware::{Clock, SimulatedHardware, SystemClock, VirtualClock};
use wallplot_rs::motion::Motor;
use wallplot_rs::path::NormalizedJob;
use wallplot_rs::plotter::{JobReport, Plotter, PlotterError};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Wall plotter motion control
#[derive(Parser, Debug)]
#[command(name = "wallplot", version, about = "Draw CSV path files on a two-cable wall plotter.")]
struct Cli {
    /// Path to a TOML config file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scale a path file into the envelope and draw it
    Draw {
        file: String,
        /// Honor step and pen delays in wall-clock time
        #[arg(long)]
        realtime: bool,
        /// Print the job report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse and normalize a path file without moving anything
    Inspect {
        file: String,
        #[arg(long)]
        json: bool,
    },
    /// Draw the built-in calibration square and circle
    Calibrate {
        #[arg(long)]
        realtime: bool,
    },
    /// Pulse a single motor
    Jog {
        #[arg(long, value_enum)]
        motor: MotorArg,
        /// Signed step count
        #[arg(long, allow_hyphen_values = true)]
        steps: i64,
    },
    /// List path files in a directory
    List {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MotorArg {
    M1,
    M2,
}

impl From<MotorArg> for Motor {
    fn from(arg: MotorArg) -> Self {
        match arg {
            MotorArg::M1 => Motor::M1,
            MotorArg::M2 => Motor::M2,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, BoxError> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            Ok(config::load_config(&path.to_string_lossy())?)
        }
        None => {
            tracing::info!("No config file given, using defaults");
            Ok(Config::default())
        }
    }
}

fn build_plotter(config: &Config, realtime: bool) -> Result<Plotter, PlotterError> {
    let clock: Box<dyn Clock> = if realtime {
        Box::new(SystemClock::new())
    } else {
        Box::new(VirtualClock::new())
    };
    let (actuators, _trace) = SimulatedHardware::build(config, clock)?;
    Plotter::new(config, actuators)
}

fn print_report(report: &JobReport, json: bool) -> Result<(), BoxError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "Job {}: {} strokes, {} points, {} moves, M1 {} / M2 {} pulses, {} pen moves, {:.1}s",
            report.id,
            report.strokes,
            report.points,
            report.motion.moves,
            report.motion.pulses_m1,
            report.motion.pulses_m2,
            report.motion.pen_transitions,
            report.elapsed_secs
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    wallplot_rs::init_logging(cli.verbose);

    tracing::info!("Starting wallplot {}", env!("CARGO_PKG_VERSION"));
    let config = load_config(cli.config.as_ref())?;
    tracing::info!(
        "Plotter: {} (anchors {:?} / {:?}, {:.5} mm/step)",
        config.machine.name.as_deref().unwrap_or("Unknown"),
        config.machine.left_anchor,
        config.machine.right_anchor,
        config.motors.mm_per_step()
    );

    let files = FileManager::default();

    match cli.command {
        Commands::Draw { file, realtime, json } => {
            let parsed = files.load_job(&file).await?;
            // Fail before any motion when the file holds nothing drawable
            let job = NormalizedJob::from_parsed(parsed, config.job.target_width, config.job.target_height)
                .map_err(|e| {
                    tracing::error!("Refusing to draw '{}': {}", file, e);
                    e
                })?;
            let report = tokio::task::spawn_blocking(move || -> Result<JobReport, PlotterError> {
                let mut plotter = build_plotter(&config, realtime)?;
                plotter.draw_job(&job)
            })
            .await??;
            print_report(&report, json)?;
        }
        Commands::Inspect { file, json } => {
            let parsed = files.load_job(&file).await?;
            let job = NormalizedJob::from_parsed(parsed, config.job.target_width, config.job.target_height)?;
            if json {
                let summary = serde_json::json!({
                    "strokes": job.strokes.len(),
                    "points": job.point_count(),
                    "skipped": job.skipped,
                    "transform": job.transform,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let b = job.transform.bbox;
                println!("Strokes: {}  Points: {}  Skipped: {}", job.strokes.len(), job.point_count(), job.skipped.len());
                println!("Bounds: X {} .. {}, Y {} .. {}", b.min_x, b.max_x, b.min_y, b.max_y);
                println!("Scale: {:.4}  Center: {}", job.transform.scale, job.transform.center);
            }
        }
        Commands::Calibrate { realtime } => {
            let report = tokio::task::spawn_blocking(move || -> Result<JobReport, PlotterError> {
                let mut plotter = build_plotter(&config, realtime)?;
                plotter.draw_calibration()
            })
            .await??;
            print_report(&report, false)?;
        }
        Commands::Jog { motor, steps } => {
            tokio::task::spawn_blocking(move || -> Result<(), PlotterError> {
                let mut plotter = build_plotter(&config, true)?;
                plotter.controller_mut().jog(motor.into(), steps)?;
                Ok(())
            })
            .await??;
        }
        Commands::List { dir } => {
            for file in FileManager::new(dir).list_path_files().await? {
                println!("{:>10}  {}", file.size, file.name);
            }
        }
    }

    Ok(())
}
