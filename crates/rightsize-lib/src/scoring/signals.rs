//! Signal aggregation
//!
//! Reduces an ordered sequence of telemetry samples for one device into a
//! fixed [`SignalVector`]: 95th percentiles for saturation counters, sums for
//! time-based counters, and the share of foreground time spent in light
//! application categories.

use crate::models::{SignalVector, TelemetrySample};

/// Reference VRAM capacity used to express usage as a percentage
pub const VRAM_REFERENCE_MB: f64 = 8192.0;

/// Collection interval each sample covers
pub const SAMPLE_INTERVAL_MINUTES: f64 = 5.0;

/// Application categories presumed resource-intensive
pub const HEAVY_APP_CATEGORIES: [&str; 5] = ["CAD", "ML", "VIDEO", "IDE", "BI"];

/// Percentile used for every saturation counter
const SIGNAL_PERCENTILE: f64 = 0.95;

/// Aggregates raw samples into a [`SignalVector`]
pub struct SignalAggregator {
    vram_reference_mb: f64,
    sample_interval_minutes: f64,
}

impl SignalAggregator {
    pub fn new() -> Self {
        Self {
            vram_reference_mb: VRAM_REFERENCE_MB,
            sample_interval_minutes: SAMPLE_INTERVAL_MINUTES,
        }
    }

    /// Aggregate one device's samples; an empty sequence yields zeroed
    /// counters and a fully light app mix
    pub fn aggregate<'a, I>(&self, samples: I) -> SignalVector
    where
        I: IntoIterator<Item = &'a TelemetrySample>,
    {
        let samples: Vec<&TelemetrySample> = samples.into_iter().collect();

        SignalVector {
            gpu_util_p95: p95(samples.iter().map(|s| s.gpu.util_pct)),
            vram_used_p95_pct: p95(samples.iter().map(|s| self.vram_pct(s.gpu.vram_used_mb))),
            cpu_util_p95: p95(samples.iter().map(|s| s.cpu.util_pct)),
            ram_used_p95: p95(samples.iter().map(|s| s.ram.used_pct)),
            paging_pressure_minutes: samples
                .iter()
                .map(|s| f64::from(s.ram.paging_pressure))
                .sum(),
            disk_latency_p95_ms: p95(samples.iter().map(|s| s.disk.latency_ms)),
            disk_busy_minutes: samples
                .iter()
                .map(|s| s.disk.busy_pct / 100.0 * self.sample_interval_minutes)
                .sum(),
            disk_queue_p95: p95(samples.iter().map(|s| s.disk.queue_len)),
            thermal_throttle_events: samples.iter().filter(|s| s.thermal.throttle_event).count()
                as u32,
            active_minutes: samples
                .iter()
                .map(|s| f64::from(s.gpu.active_minutes))
                .sum(),
            light_app_mix_factor: light_app_mix_factor(&samples),
        }
    }

    fn vram_pct(&self, vram_used_mb: f64) -> f64 {
        (vram_used_mb / self.vram_reference_mb * 100.0).min(100.0)
    }
}

impl Default for SignalAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// True for categories in [`HEAVY_APP_CATEGORIES`], ignoring case
pub fn is_heavy_category(category: &str) -> bool {
    HEAVY_APP_CATEGORIES
        .iter()
        .any(|heavy| heavy.eq_ignore_ascii_case(category))
}

fn light_app_mix_factor(samples: &[&TelemetrySample]) -> f64 {
    let apps = samples.iter().flat_map(|s| s.apps.iter());
    let (total, heavy) = apps.fold((0u64, 0u64), |(total, heavy), app| {
        let minutes = u64::from(app.active_minutes);
        if is_heavy_category(&app.category) {
            (total + minutes, heavy + minutes)
        } else {
            (total + minutes, heavy)
        }
    });
    // No recorded app activity counts as fully light
    let total = if total == 0 { 1 } else { total };
    (1.0 - heavy as f64 / total as f64).clamp(0.0, 1.0)
}

/// 95th percentile by nearest rank `floor(0.95 * (n - 1))` over ascending values
fn p95(values: impl Iterator<Item = f64>) -> f64 {
    let mut sorted: Vec<f64> = values.collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);
    let idx = (SIGNAL_PERCENTILE * (sorted.len() - 1) as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}
