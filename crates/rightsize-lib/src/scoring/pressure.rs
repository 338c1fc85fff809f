//! Pressure, fit and overprovision scoring
//!
//! Every composite is a fixed weighted sum of normalized signals. Weights
//! inside a composite sum to 1, so each pressure stays within `[0, 1]`.

use super::normalize::normalize;
use crate::models::{ScoreVector, SignalVector};

/// One weighted, normalized contribution to a composite score
#[derive(Debug, Clone, Copy)]
pub struct Term {
    pub weight: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Term {
    const fn new(weight: f64, floor: f64, ceiling: f64) -> Self {
        Self {
            weight,
            floor,
            ceiling,
        }
    }

    fn apply(&self, value: f64) -> f64 {
        self.weight * normalize(value, self.floor, self.ceiling)
    }
}

pub const GPU_UTIL: Term = Term::new(0.6, 40.0, 95.0);
pub const GPU_VRAM: Term = Term::new(0.4, 50.0, 98.0);
pub const CPU_UTIL: Term = Term::new(1.0, 40.0, 95.0);
pub const RAM_USED: Term = Term::new(0.7, 60.0, 98.0);
pub const RAM_PAGING: Term = Term::new(0.3, 0.0, 180.0);
pub const DISK_LATENCY: Term = Term::new(0.5, 10.0, 80.0);
pub const DISK_BUSY: Term = Term::new(0.3, 30.0, 360.0);
pub const DISK_QUEUE: Term = Term::new(0.2, 1.0, 5.0);
pub const THERMAL_EVENTS: Term = Term::new(1.0, 0.0, 15.0);

/// Active-minute range over which a device stops counting as idle
pub const ACTIVE_MINUTES: Term = Term::new(1.0, 60.0, 480.0);

/// Stress weights: gpu, ram, disk, cpu, thermal
pub const STRESS_WEIGHTS: [f64; 5] = [0.30, 0.25, 0.20, 0.20, 0.05];

/// Overprovision weights: gpu headroom, cpu headroom, ram headroom,
/// low activity, light app mix
pub const OVERPROVISION_WEIGHTS: [f64; 5] = [0.35, 0.25, 0.20, 0.10, 0.10];

/// Combine a signal vector into composite scores
pub fn score(signals: &SignalVector) -> ScoreVector {
    let gpu_pressure =
        GPU_UTIL.apply(signals.gpu_util_p95) + GPU_VRAM.apply(signals.vram_used_p95_pct);
    let cpu_pressure = CPU_UTIL.apply(signals.cpu_util_p95);
    let ram_pressure =
        RAM_USED.apply(signals.ram_used_p95) + RAM_PAGING.apply(signals.paging_pressure_minutes);
    let disk_score = DISK_LATENCY.apply(signals.disk_latency_p95_ms)
        + DISK_BUSY.apply(signals.disk_busy_minutes)
        + DISK_QUEUE.apply(signals.disk_queue_p95);
    let thermal_penalty = THERMAL_EVENTS.apply(f64::from(signals.thermal_throttle_events));

    let [w_gpu, w_ram, w_disk, w_cpu, w_thermal] = STRESS_WEIGHTS;
    let stress = w_gpu * gpu_pressure
        + w_ram * ram_pressure
        + w_disk * disk_score
        + w_cpu * cpu_pressure
        + w_thermal * thermal_penalty;
    let fit = (100.0 * (1.0 - stress)).clamp(0.0, 100.0);

    let low_active_factor = 1.0 - ACTIVE_MINUTES.apply(signals.active_minutes);
    let [o_gpu, o_cpu, o_ram, o_active, o_light] = OVERPROVISION_WEIGHTS;
    let overprov = (100.0
        * (o_gpu * (1.0 - gpu_pressure)
            + o_cpu * (1.0 - cpu_pressure)
            + o_ram * (1.0 - ram_pressure)
            + o_active * low_active_factor
            + o_light * signals.light_app_mix_factor))
        .clamp(0.0, 100.0);

    ScoreVector {
        gpu_pressure,
        cpu_pressure,
        ram_pressure,
        disk_score,
        thermal_penalty,
        fit,
        overprov,
    }
}
