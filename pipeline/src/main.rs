use clap::Parser;
use log::warn;
use radarcore::processing::DistanceCorrection;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

#[cfg(test)]
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Hourly rainfall estimation from radar reflectivity frames")]
struct Args {
    /// Reference raster defining extent, resolution and CRS of the output
    footprint_path: PathBuf,
    /// Directory holding `{day}_{hour}:*.png` frames
    root_path: PathBuf,
    /// Day token, used verbatim in frame and output names
    day: String,
    /// Load workflow settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// CRS code used in output names
    #[arg(long)]
    crs_code: Option<String>,
    /// Write `.tfw`/`.prj` sidecars next to each raster
    #[arg(long, default_value_t = false)]
    world_file: bool,
    /// Log and continue when an hour fails
    #[arg(long, default_value_t = false)]
    skip_failed_hours: bool,
    /// Add the range term to dBZ before the Z-R conversion
    #[arg(long, default_value_t = false)]
    distance_correction: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = &args.config {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::default()
    };
    if let Some(dir) = args.output_dir {
        config.output_dir = Some(dir);
    }
    if let Some(code) = args.crs_code {
        config.crs_code = code;
    }
    config.write_world_file |= args.world_file;
    config.skip_failed_hours |= args.skip_failed_hours;
    if args.distance_correction {
        config.distance_correction = DistanceCorrection::Additive;
    }

    let runner = Runner::new(config);
    let summary = runner.execute(&args.footprint_path, &args.root_path, &args.day)?;
    for (hour, reason) in &summary.failed_hours {
        warn!("hour {} skipped: {}", hour, reason);
    }

    Ok(())
}
