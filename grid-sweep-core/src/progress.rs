//! Run-wide progress counters and the ETA estimate derived from them.

use std::fmt;
use std::time::Duration;

/// Accumulators owned by the sweep loop, updated once per finished job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    images_done: usize,
    total_images: usize,
    generation_time: Duration,
    processing_time: Duration,
}

impl ProgressState {
    pub fn new(total_images: usize) -> Self {
        Self {
            total_images,
            ..Self::default()
        }
    }

    /// Folds one finished job into the counters. Returns a report only when the
    /// job saved at least one image.
    pub fn record(
        &mut self,
        saved: usize,
        generation: Duration,
        processing: Duration,
    ) -> Option<ProgressReport> {
        self.generation_time += generation;
        self.processing_time += processing;
        self.images_done += saved;
        (saved > 0).then(|| self.report())
    }

    pub fn images_done(&self) -> usize {
        self.images_done
    }

    pub fn total_images(&self) -> usize {
        self.total_images
    }

    /// Zero until the first image is done.
    pub fn average_generation_time(&self) -> Duration {
        self.per_image(self.generation_time)
    }

    /// Zero until the first image is done.
    pub fn average_processing_time(&self) -> Duration {
        self.per_image(self.processing_time)
    }

    fn per_image(&self, accumulated: Duration) -> Duration {
        if self.images_done == 0 {
            return Duration::ZERO;
        }
        accumulated.div_f64(self.images_done as f64)
    }

    /// (average generation + average processing) x images remaining.
    pub fn eta(&self) -> Duration {
        let remaining = self.total_images.saturating_sub(self.images_done);
        (self.average_generation_time() + self.average_processing_time())
            .mul_f64(remaining as f64)
    }

    /// Truncated integer percentage; zero when there is nothing to do.
    pub fn percent(&self) -> usize {
        if self.total_images == 0 {
            return 0;
        }
        self.images_done * 100 / self.total_images
    }

    pub fn report(&self) -> ProgressReport {
        ProgressReport {
            images_done: self.images_done,
            total_images: self.total_images,
            percent: self.percent(),
            eta: self.eta(),
        }
    }
}

/// Snapshot printed after each job that saved images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    pub images_done: usize,
    pub total_images: usize,
    pub percent: usize,
    pub eta: Duration,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = split_hms(self.eta);
        write!(
            f,
            "{}/{} images done ({}%), estimated time left: {}:{}:{}",
            self.images_done, self.total_images, self.percent, h, m, s
        )
    }
}

/// Whole hours, minutes and seconds of `duration`; fractions are truncated.
pub fn split_hms(duration: Duration) -> (u64, u64, u64) {
    let secs = duration.as_secs();
    (secs / 3600, secs % 3600 / 60, secs % 60)
}

/// `h:m:s` when at least an hour has passed, `m:s` otherwise. No zero padding.
pub fn format_elapsed(duration: Duration) -> String {
    match split_hms(duration) {
        (0, m, s) => format!("{m}:{s}"),
        (h, m, s) => format!("{h}:{m}:{s}"),
    }
}
