use crate::config::MotionConfig;
use crate::state::{AccelSample, OrientationState};

const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Accelerometer-only attitude and ride-dynamics estimator.
///
/// Bicycle frame: X = left/right, Y = forward/back, Z = up/down.
/// Every call to [`update`](Self::update) replaces the whole
/// [`OrientationState`]; there is no filtering across ticks.
pub struct MotionEstimator {
    config: MotionConfig,
    state: OrientationState,
    degenerate_samples: u32,
}

impl MotionEstimator {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            state: OrientationState::default(),
            degenerate_samples: 0,
        }
    }

    pub fn update(&mut self, sample: AccelSample) {
        let g = self.config.gravity_ms2;
        let (ax, ay, az) = (sample.x, sample.y, sample.z);

        // Raw magnitude
        let norm = libm::sqrtf(ax * ax + ay * ay + az * az);
        if norm == 0.0 || !norm.is_finite() {
            // Nothing to normalise against; keep last orientation
            self.degenerate_samples = self.degenerate_samples.wrapping_add(1);
            return;
        }
        let g_force = norm / g;

        // Unit gravity/force direction
        let recip_norm = 1.0 / norm;
        let gx = ax * recip_norm;
        let gy = ay * recip_norm;
        let gz = az * recip_norm;

        let lean_deg = libm::atan2f(gx, gz) * RAD_TO_DEG;
        let slope_deg = libm::atan2f(gy, gz) * RAD_TO_DEG;

        // Horizontal acceleration left after removing the gravity direction
        let lin_ax = ax - gx * g;
        let lin_ay = ay - gy * g;
        let mut lateral_g = libm::sqrtf(lin_ax * lin_ax + lin_ay * lin_ay) / g;
        if lateral_g < self.config.lateral_noise_floor_g {
            lateral_g = 0.0;
        }

        let vertical_g = libm::fabsf(az / g);
        let vibration = libm::fabsf(vertical_g - 1.0) * 100.0;

        self.state = OrientationState {
            g_force,
            slope_deg: normalize_half_turn(slope_deg),
            lean_deg: normalize_half_turn(lean_deg),
            lateral_g,
            vibration,
            crashed: is_crash(g_force, self.config.crash_threshold_g),
            temp_c: sample.temp_c,
        };
    }

    pub fn state(&self) -> &OrientationState {
        &self.state
    }

    pub fn g_force(&self) -> f32 {
        self.state.g_force
    }

    pub fn slope_deg(&self) -> f32 {
        self.state.slope_deg
    }

    pub fn lean_deg(&self) -> f32 {
        self.state.lean_deg
    }

    pub fn lateral_g(&self) -> f32 {
        self.state.lateral_g
    }

    pub fn vibration(&self) -> f32 {
        self.state.vibration
    }

    pub fn is_crash(&self) -> bool {
        self.state.crashed
    }

    pub fn temp_c(&self) -> f32 {
        self.state.temp_c
    }

    /// Zero-magnitude or non-finite samples skipped so far.
    pub fn degenerate_samples(&self) -> u32 {
        self.degenerate_samples
    }
}

/// Single-sample hard threshold, no debounce.
pub fn is_crash(g_force: f32, threshold_g: f32) -> bool {
    g_force > threshold_g
}

// atan2 yields [-180, 180]; fold the -180 edge onto +180.
fn normalize_half_turn(deg: f32) -> f32 {
    if deg <= -180.0 {
        deg + 360.0
    } else {
        deg
    }
}
