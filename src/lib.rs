#![cfg_attr(not(test), no_std)]

//! smartbike_telemetry - acquisition core of an onboard bicycle telemetry node
//!
//! Three independent components are sampled once per acquisition tick:
//! - [`drivers::motion::MotionEstimator`]: accelerometer → orientation, lateral G,
//!   road vibration, crash flag
//! - [`drivers::odometer::OdometerTracker`]: GPS fixes → filtered travelled distance
//! - [`drivers::heart_rate::HeartRateLink`]: BLE heart-rate strap discovery/connection
//!
//! [`telemetry::TelemetryNode`] owns all three and produces a
//! [`state::TelemetrySnapshot`] for the publisher and display.

pub mod logging;

pub mod config;
pub mod drivers;
pub mod error;
pub mod state;
pub mod tasks;
pub mod telemetry;

pub use config::NodeConfig;
pub use error::{RadioError, SensorError};
pub use state::{AccelSample, GeoFix, OrientationState, TelemetrySnapshot};
pub use telemetry::TelemetryNode;
