//! Simulation harness: runs a path file or a built-in scenario against
//! simulated actuators and writes the pulse trace as CSV.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use wallplot_rs::config::{self, Config};
use wallplot_rs::hardware::{ActuatorEvent, PenState, SimulatedHardware, Trace, VirtualClock};
use wallplot_rs::motion::{DirectionInvert, Kinematics, Motor, StepPair, WallKinematics};
use wallplot_rs::path::NormalizedJob;
use wallplot_rs::plotter::{JobReport, Plotter};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const SCENARIOS: &[(&str, &str)] = &[
    ("calibration", "100 mm square with a radius 40 mm circle"),
    ("square", "single closed square stroke"),
    ("zigzag", "three strokes of alternating diagonals"),
];

/// Simulation Harness CLI
#[derive(Parser, Debug)]
#[command(name = "sim-harness", about = "Run plotter jobs against simulated actuators and dump the pulse trace.")]
pub struct Cli {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for trace.csv and report.json
    #[arg(short, long, default_value = "./sim_output")]
    output: PathBuf,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available built-in scenarios
    ListScenarios,
    /// Run a built-in scenario (default: calibration)
    Scenario { name: Option<String> },
    /// Run a path file
    File { path: PathBuf },
}

/// One row of the trace CSV.
#[derive(Debug, Serialize)]
struct TraceRecord {
    index: usize,
    event: &'static str,
    motor: Option<Motor>,
    direction: Option<i64>,
    pen: Option<PenState>,
    m1: i64,
    m2: i64,
    x: Option<f64>,
    y: Option<f64>,
}

fn scenario_source(name: &str) -> Option<&'static str> {
    match name {
        "square" => Some("0,0;100,0;100,100;0,100;0,0\n"),
        "zigzag" => Some("0,0;10,10;20,0;30,10\n0,20;10,30;20,20;30,30\n0,40;30,40\n"),
        _ => None,
    }
}

fn run(config: &Config, job: Option<&NormalizedJob>) -> Result<(JobReport, Trace), BoxError> {
    let (actuators, trace) = SimulatedHardware::build(config, Box::new(VirtualClock::new()))?;
    let mut plotter = Plotter::new(config, actuators)?;
    let report = match job {
        Some(job) => plotter.draw_job(job)?,
        None => plotter.draw_calibration()?,
    };
    Ok((report, trace))
}

/// Replays the trace from the start position, reconstructing step counts
/// and pen position after every event.
fn write_trace(config: &Config, trace: &Trace, path: &Path) -> Result<usize, BoxError> {
    let kinematics = WallKinematics::new(config.anchors());
    let invert = DirectionInvert { m1: config.motors.invert_m1, m2: config.motors.invert_m2 };
    let mut steps = kinematics.cartesian_to_motors(config.start());

    let mut wtr = csv::Writer::from_path(path)?;
    let events = trace.events();
    for (index, event) in events.iter().enumerate() {
        let record = match *event {
            ActuatorEvent::Step { motor, direction } => {
                let delta = if invert.for_motor(motor) { -direction.sign() } else { direction.sign() };
                match motor {
                    Motor::M1 => steps.m1 += delta,
                    Motor::M2 => steps.m2 += delta,
                }
                trace_record(index, &kinematics, steps, Some(motor), Some(delta), None)
            }
            ActuatorEvent::Pen(state) => trace_record(index, &kinematics, steps, None, None, Some(state)),
        };
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(events.len())
}

fn trace_record(
    index: usize,
    kinematics: &WallKinematics,
    steps: StepPair,
    motor: Option<Motor>,
    direction: Option<i64>,
    pen: Option<PenState>,
) -> TraceRecord {
    let position = kinematics.motors_to_cartesian(steps).ok();
    TraceRecord {
        index,
        event: if pen.is_some() { "pen" } else { "step" },
        motor,
        direction,
        pen,
        m1: steps.m1,
        m2: steps.m2,
        x: position.map(|p| p.x),
        y: position.map(|p| p.y),
    }
}

fn main() {
    let cli = Cli::parse();
    wallplot_rs::init_logging(cli.verbose);

    let config = if let Some(ref path) = cli.config {
        match config::load_config(&path.to_string_lossy()) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let job = match cli.command {
        Some(Commands::ListScenarios) => {
            for (name, about) in SCENARIOS {
                println!("{name:<12} {about}");
            }
            return;
        }
        None => None,
        Some(Commands::Scenario { name }) => {
            let name = name.unwrap_or_else(|| "calibration".to_string());
            if name == "calibration" {
                None
            } else {
                let Some(source) = scenario_source(&name) else {
                    eprintln!("Unknown scenario '{name}'");
                    std::process::exit(2);
                };
                Some(source.to_string())
            }
        }
        Some(Commands::File { path }) => match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                eprintln!("Failed to read {}: {e}", path.display());
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = simulate(&cli.output, &config, job.as_deref()) {
        eprintln!("Simulation failed: {e}");
        std::process::exit(1);
    }
}

fn simulate(output: &Path, config: &Config, source: Option<&str>) -> Result<(), BoxError> {
    let job = source
        .map(|s| NormalizedJob::from_source(s, config.job.target_width, config.job.target_height))
        .transpose()?;
    let (report, trace) = run(config, job.as_ref())?;

    std::fs::create_dir_all(output)?;
    let trace_path = output.join("trace.csv");
    let rows = write_trace(config, &trace, &trace_path)?;
    let report_path = output.join("report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;

    println!(
        "{} events ({} M1 / {} M2 pulses, {} pen moves) over {:.1}s simulated",
        rows,
        report.motion.pulses_m1,
        report.motion.pulses_m2,
        report.motion.pen_transitions,
        report.elapsed_secs
    );
    println!("Trace: {}\nReport: {}", trace_path.display(), report_path.display());
    Ok(())
}
