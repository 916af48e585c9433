//! Error types
//!
//! Nothing here is fatal: radio errors drive [`HeartRateLink`] back toward
//! scanning, sensor errors make the acquisition tick skip one sample.
//!
//! [`HeartRateLink`]: crate::drivers::heart_rate::HeartRateLink

use core::fmt;

/// BLE radio operation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Radio refused to start scanning
    ScanFailed,
    /// Link-layer connection was not established
    ConnectFailed,
    /// GATT service/characteristic discovery failed
    AttributeDiscoveryFailed,
    /// Peripheral does not expose a subscribable heart-rate measurement
    CharacteristicMissing,
    /// Enabling notifications failed
    SubscribeFailed,
    /// Operation did not complete in time
    Timeout,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RadioError::ScanFailed => "scan failed",
            RadioError::ConnectFailed => "connect failed",
            RadioError::AttributeDiscoveryFailed => "attribute discovery failed",
            RadioError::CharacteristicMissing => "heart-rate characteristic missing",
            RadioError::SubscribeFailed => "subscribe failed",
            RadioError::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Sample source failures (IMU bus, serial port)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transaction failed
    Bus,
    /// No new data since the last poll
    NotReady,
    /// Data arrived but could not be decoded
    Garbage,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Bus => f.write_str("bus error"),
            SensorError::NotReady => f.write_str("not ready"),
            SensorError::Garbage => f.write_str("garbage data"),
        }
    }
}
