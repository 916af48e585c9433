//! GPS odometer
//!
//! Accumulates travelled distance from a stream of fixes. A fix only moves the
//! odometer when it is valid, has enough satellites, and lands strictly between
//! `min_step_m` and `max_step_m` from the last accepted point. Rejected deltas
//! leave the reference untouched, so the next fix is measured from the same
//! (possibly stale) point.

use crate::config::OdometerConfig;
use crate::drivers::geo::haversine_m;
use crate::state::{GeoFix, OdometerState};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Why fixes were accepted or dropped (wrapping counters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OdometerStats {
    pub accepted: u32,
    pub rejected_quality: u32, // invalid or too few satellites
    pub rejected_dither: u32,  // delta <= min_step_m
    pub rejected_outlier: u32, // delta >= max_step_m
}

/// Outcome of a single [`OdometerTracker::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixOutcome {
    Rejected,
    Seeded,
    Accepted { delta_m: f64 },
    Dither { delta_m: f64 },
    Outlier { delta_m: f64 },
}

pub struct OdometerTracker {
    config: OdometerConfig,
    state: OdometerState,
    /// Clock at the last `advance_clock`, and the u64 time accumulated up to it.
    clock_ms: u32,
    elapsed_ms: u64,
    stats: OdometerStats,
}

impl OdometerTracker {
    /// `now_ms` marks process start for the average-speed calculation.
    pub fn new(config: OdometerConfig, now_ms: u32) -> Self {
        Self {
            config,
            state: OdometerState::default(),
            clock_ms: now_ms,
            elapsed_ms: 0,
            stats: OdometerStats::default(),
        }
    }

    pub fn update(&mut self, fix: &GeoFix) -> FixOutcome {
        self.state.ticks_since_start = self.state.ticks_since_start.wrapping_add(1);

        if !self.fix_usable(fix) {
            self.stats.rejected_quality = self.stats.rejected_quality.wrapping_add(1);
            return FixOutcome::Rejected;
        }

        let point = fix.point();
        let Some(reference) = self.state.reference else {
            crate::log_info!("odometer seeded at {}, {}", point.lat, point.lon);
            self.state.reference = Some(point);
            return FixOutcome::Seeded;
        };

        let delta_m = haversine_m(reference, point);
        if delta_m <= self.config.min_step_m {
            self.stats.rejected_dither = self.stats.rejected_dither.wrapping_add(1);
            FixOutcome::Dither { delta_m }
        } else if delta_m >= self.config.max_step_m {
            self.stats.rejected_outlier = self.stats.rejected_outlier.wrapping_add(1);
            FixOutcome::Outlier { delta_m }
        } else {
            self.state.total_distance_m += delta_m;
            self.state.reference = Some(point);
            self.stats.accepted = self.stats.accepted.wrapping_add(1);
            FixOutcome::Accepted { delta_m }
        }
    }

    fn fix_usable(&self, fix: &GeoFix) -> bool {
        if !fix.valid || !fix.lat.is_finite() || !fix.lon.is_finite() {
            return false;
        }
        match fix.sats {
            Some(sats) => sats >= self.config.min_satellites,
            None => true,
        }
    }

    pub fn state(&self) -> &OdometerState {
        &self.state
    }

    pub fn stats(&self) -> &OdometerStats {
        &self.stats
    }

    pub fn total_distance_m(&self) -> f64 {
        self.state.total_distance_m
    }

    pub fn odometer_km(&self) -> f64 {
        self.state.total_distance_m / 1000.0
    }

    /// Fold the wrapping u32 clock into the u64 elapsed time. Must be called at
    /// least once per u32 wrap (~49.7 days); the node does it every tick.
    pub fn advance_clock(&mut self, now_ms: u32) {
        self.elapsed_ms += u64::from(now_ms.wrapping_sub(self.clock_ms));
        self.clock_ms = now_ms;
    }

    /// Time since process start.
    pub fn elapsed_ms(&self, now_ms: u32) -> u64 {
        self.elapsed_ms + u64::from(now_ms.wrapping_sub(self.clock_ms))
    }

    /// Average speed since process start (km/h); 0 before any time has elapsed.
    pub fn average_speed_kmph(&self, now_ms: u32) -> f64 {
        let elapsed_ms = self.elapsed_ms(now_ms);
        if elapsed_ms == 0 {
            return 0.0;
        }
        let hours = elapsed_ms as f64 / MS_PER_HOUR;
        self.odometer_km() / hours
    }
}
