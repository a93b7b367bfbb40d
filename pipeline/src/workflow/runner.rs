use crate::workflow::config::WorkflowConfig;
use crate::workflow::sidecar::write_sidecars;
use anyhow::Context;
use log::{info, warn};
use radarcore::geo::{GeoGrid, RasterBackend, TiffBackend};
use radarcore::ingest::{DirectoryFrameSource, FrameDecoder, FrameSource, ImageFrameDecoder};
use radarcore::math::FieldStats;
use radarcore::processing::SignalProcessor;
use radarcore::telemetry::MetricsSnapshot;
use radarcore::RainfallEstimator;
use std::fs;
use std::path::{Path, PathBuf};

pub const HOURS_PER_DAY: u32 = 24;

#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub empty_hours: Vec<u32>,
    /// Only populated when failed hours are skipped.
    pub failed_hours: Vec<(u32, String)>,
    pub metrics: MetricsSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Estimates and writes every hour of `day` from the frames under `root`.
    pub fn execute(&self, footprint: &Path, root: &Path, day: &str) -> anyhow::Result<RunSummary> {
        let geogrid = GeoGrid::open(TiffBackend::new(), footprint)
            .with_context(|| format!("reading footprint {}", footprint.display()))?;
        let processor = SignalProcessor::new(geogrid.footprint(), self.config.distance_correction);
        let estimator = RainfallEstimator::new(
            processor,
            DirectoryFrameSource::new(root),
            ImageFrameDecoder,
        );

        if let Some(dir) = &self.config.output_dir {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
        }

        self.run_day(&geogrid, &estimator, day)
    }

    pub fn run_day<B, S, D>(
        &self,
        geogrid: &GeoGrid<B>,
        estimator: &RainfallEstimator<S, D>,
        day: &str,
    ) -> anyhow::Result<RunSummary>
    where
        B: RasterBackend,
        S: FrameSource,
        D: FrameDecoder,
    {
        let mut summary = RunSummary::default();

        for hour in 0..HOURS_PER_DAY {
            match self.run_hour(geogrid, estimator, day, hour) {
                Ok(Some(path)) => {
                    println!("Saved {}", path.display());
                    summary.written.push(path);
                }
                Ok(None) => summary.empty_hours.push(hour),
                Err(err) if self.config.skip_failed_hours => {
                    warn!("skipping {} hour {}: {:#}", day, hour, err);
                    summary.failed_hours.push((hour, format!("{:#}", err)));
                }
                Err(err) => return Err(err),
            }
        }

        summary.metrics = estimator.metrics().snapshot();
        info!(
            "{}: {} rasters written, {} hours without data, {} hours failed, {} frames processed",
            day,
            summary.written.len(),
            summary.empty_hours.len(),
            summary.failed_hours.len(),
            summary.metrics.frames_processed
        );
        Ok(summary)
    }

    fn run_hour<B, S, D>(
        &self,
        geogrid: &GeoGrid<B>,
        estimator: &RainfallEstimator<S, D>,
        day: &str,
        hour: u32,
    ) -> anyhow::Result<Option<PathBuf>>
    where
        B: RasterBackend,
        S: FrameSource,
        D: FrameDecoder,
    {
        let Some(estimate) = estimator
            .aggregate(day, hour)
            .with_context(|| format!("estimating rainfall for {} hour {}", day, hour))?
        else {
            return Ok(None);
        };

        if let Some(stats) = FieldStats::of(estimate.field.view()) {
            info!(
                "{} hour {}: {} frames, mean {:.3} mm/h, max {:.3} mm/h, {} non-finite cells",
                day, hour, estimate.frame_count, stats.mean, stats.max, stats.non_finite
            );
        }

        let path = self.config.output_path(day, hour);
        geogrid
            .save_as_raster(estimate.field.view(), &path)
            .with_context(|| format!("writing {}", path.display()))?;
        if self.config.write_world_file {
            write_sidecars(geogrid, &path)?;
        }
        Ok(Some(path))
    }
}
