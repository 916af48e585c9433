//! Acquisition-tick aggregate
//!
//! The three components never share mutable state; they only meet here, when
//! they are sampled into the same [`TelemetrySnapshot`].

use crate::config::NodeConfig;
use crate::drivers::ble::BleRadio;
use crate::drivers::heart_rate::HeartRateLink;
use crate::drivers::motion::MotionEstimator;
use crate::drivers::odometer::OdometerTracker;
use crate::state::{AccelSample, GeoFix, TelemetrySnapshot};

pub struct TelemetryNode<R: BleRadio> {
    config: NodeConfig,
    motion: MotionEstimator,
    odometer: OdometerTracker,
    heart_rate: HeartRateLink<R>,
    last_fix: GeoFix,
}

impl<R: BleRadio> TelemetryNode<R> {
    /// `now_ms` is taken as process start for average speed.
    pub fn new(radio: R, config: NodeConfig, now_ms: u32) -> Self {
        Self {
            config,
            motion: MotionEstimator::new(config.motion),
            odometer: OdometerTracker::new(config.odometer, now_ms),
            heart_rate: HeartRateLink::new(radio, config.heart_rate),
            last_fix: GeoFix::default(),
        }
    }

    /// One acquisition tick. A missing sample or fix only skips its own
    /// component; the heart-rate link is always polled.
    pub fn tick(&mut self, now_ms: u32, sample: Option<AccelSample>, fix: Option<GeoFix>) {
        if let Some(sample) = sample {
            self.motion.update(sample);
        }
        self.odometer.advance_clock(now_ms);
        if let Some(fix) = fix {
            self.odometer.update(&fix);
            self.last_fix = fix;
        }
        self.heart_rate.update(now_ms);
    }

    pub fn snapshot(&self, now_ms: u32) -> TelemetrySnapshot {
        let o = self.motion.state();
        let fix = &self.last_fix;
        let sats = fix.sats.unwrap_or(0);
        // A receiver that reports no count is not gated, same as the odometer
        let enough_sats = fix.sats.map_or(true, |s| s >= self.config.odometer.min_satellites);

        let (lat, lon, alt_m, speed_kmph) = if fix.valid {
            (fix.lat, fix.lon, fix.alt_m, fix.speed_kmph)
        } else {
            (0.0, 0.0, 0.0, 0.0)
        };

        TelemetrySnapshot {
            bpm: self.heart_rate.bpm(),
            hr_connected: self.heart_rate.is_connected(),
            link_state: self.heart_rate.state(),

            g_force: o.g_force,
            slope_deg: o.slope_deg,
            lean_deg: o.lean_deg,
            lateral_g: o.lateral_g,
            vibration: o.vibration,
            crashed: o.crashed,
            temp_c: o.temp_c,

            lat,
            lon,
            alt_m,
            speed_kmph,
            sats,
            has_fix: fix.valid && enough_sats,

            odometer_km: self.odometer.odometer_km(),
            avg_speed_kmph: self.odometer.average_speed_kmph(now_ms),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn motion(&self) -> &MotionEstimator {
        &self.motion
    }

    pub fn odometer(&self) -> &OdometerTracker {
        &self.odometer
    }

    pub fn heart_rate(&self) -> &HeartRateLink<R> {
        &self.heart_rate
    }

    pub fn heart_rate_mut(&mut self) -> &mut HeartRateLink<R> {
        &mut self.heart_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GRAVITY_MS2;
    use crate::drivers::ble::mock::{MockPeripheral, MockRadio};
    use crate::drivers::geo::{offset_north, GeoPoint};
    use crate::state::LinkState;

    const START: GeoPoint = GeoPoint::new(45.070_312, 7.686_856);

    fn fix_at(p: GeoPoint, sats: u8) -> GeoFix {
        GeoFix {
            lat: p.lat,
            lon: p.lon,
            alt_m: 239.0,
            speed_kmph: 21.5,
            sats: Some(sats),
            valid: true,
        }
    }

    fn node() -> TelemetryNode<MockRadio> {
        TelemetryNode::new(MockRadio::new(), NodeConfig::default(), 0)
    }

    #[test]
    fn fresh_node_snapshot_is_quiet() {
        let n = node();
        let s = n.snapshot(0);
        assert_eq!(s.bpm, 0);
        assert!(!s.hr_connected);
        assert_eq!(s.link_state, LinkState::Idle);
        assert_eq!(s.g_force, 1.0);
        assert!(!s.crashed);
        assert!(!s.has_fix);
        assert_eq!(s.odometer_km, 0.0);
        assert_eq!(s.avg_speed_kmph, 0.0);
    }

    #[test]
    fn ride_aggregates_all_components() {
        let mut n = node();
        let strap = MockPeripheral::new("Polar H10 7E3A");
        let handle = strap.handle();
        n.heart_rate_mut().radio_mut().advertise(strap);

        let level = AccelSample::new(0.0, 0.0, GRAVITY_MS2, 22.0);
        let mut here = START;
        n.tick(0, Some(level), Some(fix_at(here, 9)));
        for i in 1..=10u32 {
            here = offset_north(here, 10.0);
            if i == 5 {
                handle.notify(&[0x00, 128]);
            }
            n.tick(i * 1_000, Some(level), Some(fix_at(here, 9)));
        }

        let s = n.snapshot(10_000);
        assert!(s.hr_connected);
        assert_eq!(s.bpm, 128);
        assert!((s.odometer_km - 0.1).abs() < 0.001);
        // 100 m in 10 s = 36 km/h
        assert!((s.avg_speed_kmph - 36.0).abs() < 0.2);
        assert!(s.has_fix);
        assert_eq!(s.sats, 9);
        assert!((s.lat - here.lat).abs() < 1e-12);
        assert_eq!(s.speed_kmph, 21.5);
        assert_eq!(s.temp_c, 22.0);
    }

    #[test]
    fn missing_inputs_skip_only_their_component() {
        let mut n = node();
        n.tick(0, Some(AccelSample::new(0.0, 0.0, 2.0 * GRAVITY_MS2, 20.0)), None);
        let g_before = n.snapshot(0).g_force;

        n.tick(100, None, Some(fix_at(START, 7)));
        let s = n.snapshot(100);
        assert_eq!(s.g_force, g_before);
        assert!(s.has_fix);
        assert_eq!(n.heart_rate().radio().polls, 2);
    }

    #[test]
    fn invalid_fix_zeroes_raw_position() {
        let mut n = node();
        n.tick(0, None, Some(fix_at(START, 8)));
        let mut lost = fix_at(START, 8);
        lost.valid = false;
        n.tick(100, None, Some(lost));

        let s = n.snapshot(100);
        assert_eq!(s.lat, 0.0);
        assert_eq!(s.lon, 0.0);
        assert_eq!(s.alt_m, 0.0);
        assert_eq!(s.speed_kmph, 0.0);
        assert!(!s.has_fix);
    }

    #[test]
    fn low_satellite_fix_is_reported_but_not_a_fix() {
        let mut n = node();
        n.tick(0, None, Some(fix_at(START, 3)));
        let s = n.snapshot(0);
        assert_eq!(s.sats, 3);
        assert!(!s.has_fix);
        assert_eq!(n.odometer().state().reference, None);
    }

    #[test]
    fn fix_without_satellite_count_counts_as_fix() {
        let mut n = node();
        let mut fix = fix_at(START, 0);
        fix.sats = None;
        n.tick(0, None, Some(fix));

        let s = n.snapshot(0);
        assert!(s.has_fix);
        assert_eq!(s.sats, 0);
        assert_eq!(n.odometer().state().reference, Some(START));
    }

    #[test]
    fn average_speed_survives_clock_wrap() {
        const DAY_MS: u32 = 86_400_000;
        let start = u32::MAX - 1_000;
        let mut n = TelemetryNode::new(MockRadio::new(), NodeConfig::default(), start);
        n.tick(start, None, Some(fix_at(START, 8)));

        let mut now = start;
        for _ in 0..60 {
            now = now.wrapping_add(DAY_MS);
            n.tick(now, None, None);
        }
        n.tick(now, None, Some(fix_at(offset_north(START, 50.0), 8)));

        // 0.05 km over 60 days
        let expected = 0.05 / (60.0 * 24.0);
        let avg = n.snapshot(now).avg_speed_kmph;
        assert!((avg - expected).abs() < expected * 0.01, "avg = {avg}");
    }

    #[test]
    fn crash_shows_in_snapshot() {
        let mut n = node();
        n.tick(0, Some(AccelSample::new(15.0, 30.0, 20.0, 20.0)), None);
        assert!(n.snapshot(0).crashed);
    }
}
