use std::time::Instant;

/// Counters and detection timing for one loop lifetime.
///
/// The manager updates these on every tick; hosts read them for
/// diagnostics and log [`LoopStats::summary_string`] on shutdown.
#[derive(Clone, Copy, Debug)]
pub struct LoopStats {
    pub ticks: usize,
    pub detections: usize,
    pub failures: usize,
    pub not_ready: usize,
    pub discarded: usize,
    pub faces_published: usize,
    detect_ms_total: f64,
    detect_samples: usize,
    started: Instant,
}

impl LoopStats {
    pub fn new() -> Self {
        Self {
            ticks: 0,
            detections: 0,
            failures: 0,
            not_ready: 0,
            discarded: 0,
            faces_published: 0,
            detect_ms_total: 0.0,
            detect_samples: 0,
            started: Instant::now(),
        }
    }

    pub fn record_detection(&mut self, duration_ms: f64, faces: usize) {
        self.detections += 1;
        self.faces_published += faces;
        self.record_timing(duration_ms);
    }

    pub fn record_failure(&mut self, duration_ms: f64) {
        self.failures += 1;
        self.record_timing(duration_ms);
    }

    /// Mean time spent inside the detector, successful or not.
    pub fn average_detect_ms(&self) -> Option<f64> {
        if self.detect_samples == 0 {
            return None;
        }
        Some(self.detect_ms_total / self.detect_samples as f64)
    }

    fn record_timing(&mut self, duration_ms: f64) {
        self.detect_ms_total += duration_ms;
        self.detect_samples += 1;
    }

    /// Returns the formatted summary, or `None` if no tick ran.
    pub fn summary_string(&self) -> Option<String> {
        if self.ticks == 0 {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Loop summary ({} ticks, {elapsed_s:.1}s):",
            self.ticks
        )];
        lines.push(format!(
            "  detections: {}  failures: {}  not ready: {}  discarded: {}",
            self.detections, self.failures, self.not_ready, self.discarded
        ));
        if self.detections > 0 {
            let avg_faces = self.faces_published as f64 / self.detections as f64;
            lines.push(format!("  faces per detection: avg {avg_faces:.1}"));
        }
        if let Some(avg_ms) = self.average_detect_ms() {
            lines.push(format!("  detect: avg {avg_ms:6.1}ms"));
        }
        if elapsed_s > 0.0 {
            let rate = (self.detections + self.failures) as f64 / elapsed_s;
            lines.push(format!("  detection rate: {rate:.1} Hz"));
        }
        Some(lines.join("\n"))
    }
}

impl Default for LoopStats {
    fn default() -> Self {
        Self::new()
    }
}
