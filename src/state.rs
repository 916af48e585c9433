//! Shared state types for the acquisition tick and its consumers.
//!
//! All types are `Copy` to minimise overhead when sent through channels.

use crate::drivers::geo::GeoPoint;

// ── Raw samples ───────────────────────────────────────────────────────────────

/// One accelerometer + die temperature reading, consumed immediately.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelSample {
    pub x: f32, // m/s²
    pub y: f32,
    pub z: f32,
    pub temp_c: f32,
}

impl AccelSample {
    pub const fn new(x: f32, y: f32, z: f32, temp_c: f32) -> Self {
        Self { x, y, z, temp_c }
    }
}

/// One decoded GPS report. `sats` is `None` when the receiver did not report
/// a satellite count.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeoFix {
    pub lat: f64, // Decimal Degrees
    pub lon: f64, // Decimal Degrees
    pub alt_m: f32,
    pub speed_kmph: f32,
    pub sats: Option<u8>,
    pub valid: bool,
}

impl GeoFix {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

// ── Component state ───────────────────────────────────────────────────────────

/// Output of the motion estimator, overwritten wholesale each tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OrientationState {
    pub g_force: f32,
    pub slope_deg: f32, // pitch, + uphill
    pub lean_deg: f32,  // roll
    pub lateral_g: f32,
    pub vibration: f32, // |vertical G - 1| × 100
    pub crashed: bool,
    pub temp_c: f32,
}

impl Default for OrientationState {
    // At rest: 1 G straight down.
    fn default() -> Self {
        Self {
            g_force: 1.0,
            slope_deg: 0.0,
            lean_deg: 0.0,
            lateral_g: 0.0,
            vibration: 0.0,
            crashed: false,
            temp_c: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OdometerState {
    /// Last fix that passed the acceptance filter; `None` until seeded.
    pub reference: Option<GeoPoint>,
    /// Monotonically non-decreasing.
    pub total_distance_m: f64,
    pub ticks_since_start: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    #[default]
    Idle,
    Scanning,
    Connecting,
    Connected,
    Disconnecting,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Idle => "idle",
            LinkState::Scanning => "scanning",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Disconnecting => "disconnecting",
        }
    }
}

// ── Published snapshot ────────────────────────────────────────────────────────

/// Everything the publisher and display read, sampled at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySnapshot {
    // Heart rate
    pub bpm: u16,
    pub hr_connected: bool,
    pub link_state: LinkState,

    // Motion
    pub g_force: f32,
    pub slope_deg: f32,
    pub lean_deg: f32,
    pub lateral_g: f32,
    pub vibration: f32,
    pub crashed: bool,
    pub temp_c: f32,

    // Raw fix (zeroed while the fix is invalid)
    pub lat: f64,
    pub lon: f64,
    pub alt_m: f32,
    pub speed_kmph: f32,
    pub sats: u8,
    pub has_fix: bool,

    // Odometer
    pub odometer_km: f64,
    pub avg_speed_kmph: f64,
}
