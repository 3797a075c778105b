// wallplot-rs: motion core for a two-cable wall plotter

pub mod config;
pub mod file_manager;
pub mod hardware;
pub mod motion;
pub mod path;
pub mod plotter;

pub use config::{load_config, Config, ConfigError};
pub use file_manager::FileManager;
pub use hardware::{Actuators, PenState, SimulatedHardware, SystemClock, VirtualClock};
pub use motion::{MotionController, PlotterState, Point, StepPair};
pub use path::{NormalizedJob, PathError};
pub use plotter::{DrawCommand, JobReport, Plotter, PlotterError};

/// Install the `tracing` subscriber used by the binaries.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` over `info`.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
