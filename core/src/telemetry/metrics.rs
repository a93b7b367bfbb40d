use std::sync::Mutex;

/// Frame counters shared by the estimator and whoever reports on the run.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_processed: usize,
    pub frame_errors: usize,
    pub hours_aggregated: usize,
}

struct Metrics {
    frames_processed: usize,
    frame_errors: usize,
    hours_aggregated: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics {
                frames_processed: 0,
                frame_errors: 0,
                hours_aggregated: 0,
            }),
        }
    }

    pub fn record_frame(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames_processed += 1;
        }
    }

    pub fn record_frame_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frame_errors += 1;
        }
    }

    pub fn record_hour(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.hours_aggregated += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                frames_processed: metrics.frames_processed,
                frame_errors: metrics.frame_errors,
                hours_aggregated: metrics.hours_aggregated,
            }
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_frame();
        metrics.record_frame();
        metrics.record_frame_error();
        metrics.record_hour();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                frames_processed: 2,
                frame_errors: 1,
                hours_aggregated: 1,
            }
        );
    }
}
