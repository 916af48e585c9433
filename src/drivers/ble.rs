//! BLE central capability used by the heart-rate link.
//!
//! Every call is a non-blocking poll against the radio stack; the stack owns
//! event processing and buffering. Implementations map their HAL-specific
//! errors onto [`RadioError`].

use crate::error::RadioError;

/// GATT Heart Rate Measurement characteristic (0x2A37)
pub const HEART_RATE_MEASUREMENT_UUID: u16 = 0x2A37;

pub trait BleRadio {
    type Peripheral: BlePeripheral;

    fn scan(&mut self) -> Result<(), RadioError>;
    fn stop_scan(&mut self);
    /// Let the stack process pending radio events.
    fn poll_events(&mut self);
    /// Next advertising peripheral found by the running scan, if any.
    fn available_discovered_device(&mut self) -> Option<Self::Peripheral>;
}

pub trait BlePeripheral {
    type Characteristic: BleCharacteristic;

    /// Advertised local name ("" when not advertised)
    fn name(&self) -> &str;
    fn connect(&mut self) -> Result<(), RadioError>;
    fn discover_attributes(&mut self) -> Result<(), RadioError>;
    fn characteristic(&mut self, uuid: u16) -> Option<Self::Characteristic>;
    fn connected(&self) -> bool;
    fn disconnect(&mut self);
}

pub trait BleCharacteristic {
    fn can_subscribe(&self) -> bool;
    fn subscribe(&mut self) -> Result<(), RadioError>;
    /// True once per notification received since the previous call.
    fn value_updated(&mut self) -> bool;
    /// Bytes of the most recent notification.
    fn value(&self) -> &[u8];
}
