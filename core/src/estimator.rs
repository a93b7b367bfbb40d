use log::{debug, info};
use ndarray::Array2;
use std::path::Path;

use crate::ingest::{Frame, FrameDecoder, FrameSource};
use crate::prelude::{RadarError, RadarResult};
use crate::processing::SignalProcessor;
use crate::telemetry::MetricsRecorder;

/// Mean precipitation rate over the frames of one hour.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyEstimate {
    pub day: String,
    pub hour: u32,
    pub frame_count: usize,
    pub field: Array2<f64>,
}

/// Lists, decodes and converts the frames of an hour and averages them.
pub struct RainfallEstimator<S: FrameSource, D: FrameDecoder> {
    processor: SignalProcessor,
    source: S,
    decoder: D,
    metrics: MetricsRecorder,
}

impl<S: FrameSource, D: FrameDecoder> RainfallEstimator<S, D> {
    pub fn new(processor: SignalProcessor, source: S, decoder: D) -> Self {
        Self {
            processor,
            source,
            decoder,
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn processor(&self) -> &SignalProcessor {
        &self.processor
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn get_image_data(&self, path: &Path) -> RadarResult<Frame> {
        self.decoder.decode(path)
    }

    pub fn get_precipitation(&self, path: &Path) -> RadarResult<Array2<f64>> {
        let frame = self.get_image_data(path)?;
        self.processor.process_frame(&frame)
    }

    /// `Ok(None)` when the hour has no frames. Any frame that fails to decode
    /// or differs in shape from the first one fails the whole hour.
    pub fn aggregate(&self, day: &str, hour: u32) -> RadarResult<Option<HourlyEstimate>> {
        let paths = self.source.aggregate(day, hour)?;
        if paths.is_empty() {
            return Ok(None);
        }

        let mut sum: Option<Array2<f64>> = None;
        for path in &paths {
            let field = match self.get_precipitation(path) {
                Ok(field) => field,
                Err(err) => {
                    self.metrics.record_frame_error();
                    return Err(err);
                }
            };
            debug!("processed frame {}", path.display());
            self.metrics.record_frame();

            match sum.as_mut() {
                None => sum = Some(field),
                Some(total) => {
                    if total.dim() != field.dim() {
                        return Err(RadarError::FrameShapeMismatch {
                            path: path.clone(),
                            expected: total.dim(),
                            found: field.dim(),
                        });
                    }
                    *total += &field;
                }
            }
        }

        let frame_count = paths.len();
        let field = sum.map(|total| total / frame_count as f64);
        self.metrics.record_hour();
        info!("{} hour {}: averaged {} frames", day, hour, frame_count);
        Ok(field.map(|field| HourlyEstimate {
            day: day.to_string(),
            hour,
            frame_count,
            field,
        }))
    }
}
