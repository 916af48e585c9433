pub mod ble;
pub mod geo;
pub mod heart_rate;
pub mod motion;
pub mod nmea;
pub mod odometer;
