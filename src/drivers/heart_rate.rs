use crate::config::HeartRateConfig;
use crate::drivers::ble::{
    BleCharacteristic, BlePeripheral, BleRadio, HEART_RATE_MEASUREMENT_UUID,
};
use crate::error::RadioError;
use crate::state::LinkState;

type CharacteristicOf<R> = <<R as BleRadio>::Peripheral as BlePeripheral>::Characteristic;

// ─── Heart-rate strap link state machine ───
//
//   Idle ──(cooldown elapsed)──► Scanning ──(name match)──► Connecting
//    ▲                             │  ▲                         │
//    └──────(scan timeout)─────────┘  └──(any step failed)──────┤
//                                     ▲                         ▼
//                          Disconnecting ◄──(link lost)──── Connected
//
// Polled once per tick; every transition is a timestamp comparison or a
// radio poll result, never a wait.

/// Wrapping diagnostic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    pub scans_started: u16,
    pub scan_timeouts: u16,
    pub connect_failures: u16,
    pub disconnects: u16,
    pub readings: u32,
}

pub struct HeartRateLink<R: BleRadio> {
    radio: R,
    config: HeartRateConfig,
    state: LinkState,
    peripheral: Option<R::Peripheral>,
    hr_char: Option<CharacteristicOf<R>>,
    last_bpm: u16,
    scan_started_at_ms: u32,
    /// Start of the rescan cooldown; `None` means scan on the next tick.
    disconnected_at_ms: Option<u32>,
    stats: LinkStats,
}

impl<R: BleRadio> HeartRateLink<R> {
    pub fn new(radio: R, config: HeartRateConfig) -> Self {
        Self {
            radio,
            config,
            state: LinkState::Idle,
            peripheral: None,
            hr_char: None,
            last_bpm: 0,
            scan_started_at_ms: 0,
            disconnected_at_ms: None,
            stats: LinkStats::default(),
        }
    }

    /// Advance the state machine by one tick.
    pub fn update(&mut self, now_ms: u32) {
        self.radio.poll_events();

        match self.state {
            LinkState::Idle => self.on_idle(now_ms),
            LinkState::Scanning => self.on_scanning(now_ms),
            LinkState::Connecting => self.on_connecting(now_ms),
            LinkState::Connected => self.on_connected(now_ms),
            LinkState::Disconnecting => self.start_scan(now_ms),
        }
    }

    fn on_idle(&mut self, now_ms: u32) {
        let cooled_down = match self.disconnected_at_ms {
            None => true,
            Some(since) => now_ms.wrapping_sub(since) > self.config.rescan_pause_ms,
        };
        if cooled_down {
            self.start_scan(now_ms);
        }
    }

    fn on_scanning(&mut self, now_ms: u32) {
        if let Some(device) = self.radio.available_discovered_device() {
            if device.name().contains(self.config.target_name) {
                crate::log_info!("HR strap found: {}", device.name());
                // Radio cannot scan and connect at the same time
                self.radio.stop_scan();
                self.peripheral = Some(device);
                self.enter(LinkState::Connecting);
                return;
            }
        }

        if now_ms.wrapping_sub(self.scan_started_at_ms) > self.config.scan_timeout_ms {
            crate::log_info!("HR scan timeout");
            self.stats.scan_timeouts = self.stats.scan_timeouts.wrapping_add(1);
            self.radio.stop_scan();
            self.go_idle(now_ms);
        }
    }

    fn on_connecting(&mut self, now_ms: u32) {
        let Some(mut device) = self.peripheral.take() else {
            self.start_scan(now_ms);
            return;
        };

        match establish(&mut device) {
            Ok(hr_char) => {
                crate::log_info!("HR strap connected");
                self.peripheral = Some(device);
                self.hr_char = Some(hr_char);
                self.enter(LinkState::Connected);
            }
            Err(e) => {
                // Every failing step is retried the same way
                crate::log_warn!("HR connect failed: {}", e);
                self.stats.connect_failures = self.stats.connect_failures.wrapping_add(1);
                device.disconnect();
                self.start_scan(now_ms);
            }
        }
    }

    fn on_connected(&mut self, now_ms: u32) {
        let link_up = self.peripheral.as_ref().is_some_and(|p| p.connected());
        if !link_up {
            crate::log_warn!("HR strap disconnected");
            self.stats.disconnects = self.stats.disconnects.wrapping_add(1);
            // bpm reads 0 whenever the strap is not connected
            self.last_bpm = 0;
            self.hr_char = None;
            if let Some(mut device) = self.peripheral.take() {
                device.disconnect();
            }
            self.disconnected_at_ms = Some(now_ms);
            self.enter(LinkState::Disconnecting);
            return;
        }

        if let Some(hr_char) = self.hr_char.as_mut() {
            if hr_char.value_updated() {
                if let Some(bpm) = decode_heart_rate(hr_char.value()) {
                    self.last_bpm = bpm;
                    self.stats.readings = self.stats.readings.wrapping_add(1);
                }
            }
        }
    }

    fn start_scan(&mut self, now_ms: u32) {
        self.last_bpm = 0;
        match self.radio.scan() {
            Ok(()) => {
                crate::log_debug!("HR scanning...");
                self.scan_started_at_ms = now_ms;
                self.stats.scans_started = self.stats.scans_started.wrapping_add(1);
                self.enter(LinkState::Scanning);
            }
            Err(e) => {
                crate::log_warn!("HR {}", e);
                self.go_idle(now_ms);
            }
        }
    }

    fn go_idle(&mut self, now_ms: u32) {
        self.last_bpm = 0;
        self.disconnected_at_ms = Some(now_ms);
        self.enter(LinkState::Idle);
    }

    fn enter(&mut self, next: LinkState) {
        crate::log_debug!("HR link {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
    }

    // ── Getters ──

    /// Latest reading; 0 whenever the strap is not connected.
    pub fn bpm(&self) -> u16 {
        self.last_bpm
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// True unless a scan is running, i.e. other radios (WiFi) may associate
    /// without contending with BLE scanning.
    pub fn is_ready(&self) -> bool {
        self.state != LinkState::Scanning
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn scan_started_at_ms(&self) -> u32 {
        self.scan_started_at_ms
    }

    pub fn disconnected_at_ms(&self) -> Option<u32> {
        self.disconnected_at_ms
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }
}

/// Connect, discover, subscribe to the heart-rate measurement.
fn establish<P: BlePeripheral>(device: &mut P) -> Result<P::Characteristic, RadioError> {
    device.connect()?;
    device.discover_attributes()?;

    let mut hr_char = device
        .characteristic(HEART_RATE_MEASUREMENT_UUID)
        .ok_or(RadioError::CharacteristicMissing)?;
    if !hr_char.can_subscribe() {
        return Err(RadioError::CharacteristicMissing);
    }
    hr_char.subscribe()?;
    Ok(hr_char)
}

/// Decode a Heart Rate Measurement notification.
///
/// Flags bit 0 selects a u16 little-endian value in bytes 1..=2, otherwise a
/// u8 in byte 1. Returns `None` when the payload is too short for its format.
pub fn decode_heart_rate(bytes: &[u8]) -> Option<u16> {
    let flags = *bytes.first()?;
    if flags & 0x01 != 0 {
        let lo = *bytes.get(1)?;
        let hi = *bytes.get(2)?;
        Some(u16::from_le_bytes([lo, hi]))
    } else {
        bytes.get(1).map(|&b| b as u16)
    }
}
