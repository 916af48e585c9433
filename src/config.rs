//! Node configuration
//!
//! Compile-time defaults; there is no filesystem on the node, so overrides
//! are made in code by replacing fields of the `Default` value.

/// Standard gravity used to convert m/s² to G
pub const GRAVITY_MS2: f32 = 9.81;
/// Total G above which a sample is flagged as a crash
pub const CRASH_THRESHOLD_G: f32 = 3.5;
/// Lateral G below this reads as zero
pub const LATERAL_NOISE_FLOOR_G: f32 = 0.02;

pub const MIN_SATELLITES: u8 = 4;
/// Odometer steps at or below this are GPS dither
pub const MIN_STEP_M: f64 = 2.0;
/// Odometer steps at or above this are reacquisition/multipath jumps
pub const MAX_STEP_M: f64 = 100.0;

/// Advertised-name substring of the heart-rate strap
pub const HEART_RATE_TARGET_NAME: &str = "Polar";
pub const SCAN_TIMEOUT_MS: u32 = 8_000;
/// Radio stays idle this long after a scan timeout before rescanning
pub const RESCAN_PAUSE_MS: u32 = 2_000;

pub const TICK_PERIOD_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConfig {
    pub gravity_ms2: f32,
    pub crash_threshold_g: f32,
    pub lateral_noise_floor_g: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            gravity_ms2: GRAVITY_MS2,
            crash_threshold_g: CRASH_THRESHOLD_G,
            lateral_noise_floor_g: LATERAL_NOISE_FLOOR_G,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OdometerConfig {
    pub min_satellites: u8,
    pub min_step_m: f64,
    pub max_step_m: f64,
}

impl Default for OdometerConfig {
    fn default() -> Self {
        Self {
            min_satellites: MIN_SATELLITES,
            min_step_m: MIN_STEP_M,
            max_step_m: MAX_STEP_M,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeartRateConfig {
    /// Case-sensitive substring matched against the advertised local name
    pub target_name: &'static str,
    pub scan_timeout_ms: u32,
    pub rescan_pause_ms: u32,
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            target_name: HEART_RATE_TARGET_NAME,
            scan_timeout_ms: SCAN_TIMEOUT_MS,
            rescan_pause_ms: RESCAN_PAUSE_MS,
        }
    }
}

/// Everything [`TelemetryNode`](crate::telemetry::TelemetryNode) needs
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    pub motion: MotionConfig,
    pub odometer: OdometerConfig,
    pub heart_rate: HeartRateConfig,
    /// Acquisition tick period (ms), used by the async acquisition task
    pub tick_period_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            odometer: OdometerConfig::default(),
            heart_rate: HeartRateConfig::default(),
            tick_period_ms: TICK_PERIOD_MS,
        }
    }
}
