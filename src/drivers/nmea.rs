use core::str::FromStr;

use crate::state::GeoFix;

const KNOTS_TO_KMPH: f32 = 1.852;

/// Timeout before we declare lost communication (ms)
pub const GPS_TIMEOUT_MS: u32 = 2500;

// ─── Receiver link state ───
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiverState {
    #[default]
    Unknown,
    /// Bytes arriving, no position sentence yet
    Detected,
    ReceivingData,
    LostCommunication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NmeaFrame {
    #[default]
    None,
    Gga,
    Rmc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NmeaStats {
    pub sentences_rx: u16,    // total valid sentences parsed
    pub checksum_errors: u16, // checksum mismatches
    pub frame_errors: u16,    // buffer overflows / malformed frames
    pub gga_count: u16,
    pub rmc_count: u16,
    pub unknown_count: u16, // unrecognised sentence IDs
    pub timeouts: u16,      // number of communication timeouts
}

/// Framing-agnostic NMEA 0183 decoder producing [`GeoFix`] values.
///
/// Bytes may arrive in arbitrary chunks; a sentence is processed when its
/// terminating `\n` is seen. GGA supplies position, altitude, satellites and
/// fix quality; RMC supplies speed over ground.
pub struct NmeaParser {
    buffer: heapless::String<128>,
    fix: GeoFix,
    fix_updated: bool,
    stats: NmeaStats,
    last_frame: NmeaFrame,
    state: ReceiverState,
    last_byte_ms: u32,
    last_nav_msg_ms: u32,
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaParser {
    pub fn new() -> Self {
        Self {
            buffer: heapless::String::new(),
            fix: GeoFix::default(),
            fix_updated: false,
            stats: NmeaStats::default(),
            last_frame: NmeaFrame::None,
            state: ReceiverState::Unknown,
            last_byte_ms: 0,
            last_nav_msg_ms: 0,
        }
    }

    /// Call once per tick with the current clock and how many bytes arrived.
    pub fn update_timing(&mut self, now_ms: u32, bytes_this_tick: usize) {
        if bytes_this_tick > 0 {
            self.last_byte_ms = now_ms;
        }

        match self.state {
            ReceiverState::Unknown => {
                if bytes_this_tick > 0 {
                    self.state = ReceiverState::Detected;
                }
            }
            ReceiverState::Detected => {
                if self.stats.gga_count > 0 {
                    self.state = ReceiverState::ReceivingData;
                }
            }
            ReceiverState::ReceivingData => {
                if now_ms.wrapping_sub(self.last_nav_msg_ms) > GPS_TIMEOUT_MS {
                    crate::log_warn!("GPS lost communication");
                    self.state = ReceiverState::LostCommunication;
                    self.stats.timeouts = self.stats.timeouts.wrapping_add(1);
                    self.fix.sats = Some(0);
                    self.fix.valid = false;
                    // Consumers must see the loss, not keep the last good fix
                    self.fix_updated = true;
                }
            }
            ReceiverState::LostCommunication => {
                if bytes_this_tick > 0 {
                    self.state = ReceiverState::Detected;
                }
            }
        }
    }

    /// Process incoming bytes from the receiver.
    pub fn push_data(&mut self, data: &[u8]) {
        for &b in data {
            if b == b'$' {
                self.buffer.clear();
            }

            if self.buffer.push(b as char).is_err() {
                self.stats.frame_errors = self.stats.frame_errors.wrapping_add(1);
                self.buffer.clear();
                continue;
            }

            if b == b'\n' {
                self.parse_sentence();
                self.buffer.clear();
            }
        }
    }

    /// The fix decoded from the latest GGA, once per new GGA.
    pub fn take_fix(&mut self) -> Option<GeoFix> {
        if self.fix_updated {
            self.fix_updated = false;
            Some(self.fix)
        } else {
            None
        }
    }

    pub fn latest_fix(&self) -> &GeoFix {
        &self.fix
    }

    pub fn stats(&self) -> &NmeaStats {
        &self.stats
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn last_frame(&self) -> NmeaFrame {
        self.last_frame
    }

    fn parse_sentence(&mut self) {
        // Copy the buffer to avoid borrow conflict (self.buffer vs &mut self)
        let mut local: heapless::String<128> = heapless::String::new();
        let _ = local.push_str(self.buffer.as_str().trim());
        let s = local.as_str();

        if s.len() < 6 || !s.starts_with('$') {
            self.stats.frame_errors = self.stats.frame_errors.wrapping_add(1);
            return;
        }

        if !verify_checksum(s) {
            self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
            return;
        }

        // Talker ID is ignored: $GPGGA, $GNGGA, ... all classify as GGA
        let frame = match s.get(3..6) {
            Some("GGA") => NmeaFrame::Gga,
            Some("RMC") => NmeaFrame::Rmc,
            _ => NmeaFrame::None,
        };

        self.stats.sentences_rx = self.stats.sentences_rx.wrapping_add(1);
        self.last_frame = frame;

        match frame {
            NmeaFrame::Gga => self.parse_gga(s),
            NmeaFrame::Rmc => self.parse_rmc(s),
            NmeaFrame::None => {
                self.stats.unknown_count = self.stats.unknown_count.wrapping_add(1);
            }
        }
    }

    // ────── GGA ──────
    fn parse_gga(&mut self, s: &str) {
        self.stats.gga_count = self.stats.gga_count.wrapping_add(1);
        // $xxGGA,time,lat,NS,lon,EW,qual,sats,hdop,alt,M,geoid,M,…*CS
        let body = s.split('*').next().unwrap_or(s);
        let mut parts = body.split(',');
        parts.next(); // ID
        parts.next(); // time

        let lat_raw = parts.next().unwrap_or("");
        let ns = parts.next().unwrap_or("");
        let lon_raw = parts.next().unwrap_or("");
        let ew = parts.next().unwrap_or("");
        let qual_str = parts.next().unwrap_or("");
        let sats_str = parts.next().unwrap_or("");
        let _hdop_str = parts.next().unwrap_or("");
        let alt_str = parts.next().unwrap_or("");

        let quality = u8::from_str(qual_str).unwrap_or(0);
        self.fix.sats = u8::from_str(sats_str).ok();

        let lat = parse_coordinate(lat_raw, ns, "S");
        let lon = parse_coordinate(lon_raw, ew, "W");
        match (lat, lon) {
            (Some(lat), Some(lon)) if quality > 0 => {
                self.fix.lat = lat;
                self.fix.lon = lon;
                self.fix.valid = true;
            }
            _ => self.fix.valid = false,
        }

        if let Ok(alt) = f32::from_str(alt_str) {
            self.fix.alt_m = alt;
        }

        self.last_nav_msg_ms = self.last_byte_ms;
        self.fix_updated = true;
    }

    // ────── RMC ──────
    fn parse_rmc(&mut self, s: &str) {
        self.stats.rmc_count = self.stats.rmc_count.wrapping_add(1);
        // $xxRMC,time,status,lat,NS,lon,EW,speed,course,date,…*CS
        let body = s.split('*').next().unwrap_or(s);
        let mut parts = body.split(',');
        parts.next(); // ID
        parts.next(); // time

        let status = parts.next().unwrap_or("");

        // Position comes from GGA
        for _ in 0..4 {
            parts.next();
        }

        let speed_raw = parts.next().unwrap_or("");
        if status == "A" {
            if let Ok(knots) = f32::from_str(speed_raw) {
                self.fix.speed_kmph = knots * KNOTS_TO_KMPH;
            }
        } else {
            self.fix.speed_kmph = 0.0;
        }
    }
}

/// `ddmm.mmmm` / `dddmm.mmmm` + hemisphere → signed decimal degrees
fn parse_coordinate(raw: &str, hemisphere: &str, negative: &str) -> Option<f64> {
    let value = f64::from_str(raw).ok()?;
    let degrees = libm::floor(value / 100.0);
    let minutes = value - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;
    Some(if hemisphere == negative { -decimal } else { decimal })
}

fn verify_checksum(s: &str) -> bool {
    if let Some((content, check_str)) = s.split_once('*') {
        let content = content.strip_prefix('$').unwrap_or(content);
        let mut calc = 0u8;
        for b in content.bytes() {
            calc ^= b;
        }
        // Only take first 2 hex chars (ignore trailing \r\n or garbage)
        let hex = check_str.get(..2).unwrap_or(check_str);
        if let Ok(val) = u8::from_str_radix(hex.trim(), 16) {
            return calc == val;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &[u8] =
        b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";
    const GGA_NO_FIX: &[u8] = b"$GPGGA,123520,,,,,0,00,99.9,,M,,M,,*76\r\n";
    const GGA_SOUTH_WEST: &[u8] =
        b"$GNGGA,101112.00,3351.5200,S,15112.3400,W,2,05,1.2,12.0,M,0.0,M,,*7B\r\n";

    #[test]
    fn gga_yields_valid_fix() {
        let mut p = NmeaParser::new();
        p.push_data(GGA);

        let fix = p.take_fix().unwrap();
        assert!(fix.valid);
        assert!((fix.lat - 48.117_3).abs() < 1e-6);
        assert!((fix.lon - 11.516_666_7).abs() < 1e-6);
        assert_eq!(fix.sats, Some(8));
        assert!((fix.alt_m - 545.4).abs() < 1e-3);
        assert_eq!(p.last_frame(), NmeaFrame::Gga);
    }

    #[test]
    fn fix_is_taken_once_per_gga() {
        let mut p = NmeaParser::new();
        p.push_data(GGA);
        assert!(p.take_fix().is_some());
        assert!(p.take_fix().is_none());

        p.push_data(RMC);
        assert!(p.take_fix().is_none());
    }

    #[test]
    fn rmc_speed_in_kmph() {
        let mut p = NmeaParser::new();
        p.push_data(RMC);
        p.push_data(GGA);
        let fix = p.take_fix().unwrap();
        assert!((fix.speed_kmph - 22.4 * 1.852).abs() < 1e-3);
    }

    #[test]
    fn southern_western_hemispheres_are_negative() {
        let mut p = NmeaParser::new();
        p.push_data(GGA_SOUTH_WEST);
        let fix = p.take_fix().unwrap();
        assert!((fix.lat + 33.858_666_7).abs() < 1e-6);
        assert!((fix.lon + 151.205_666_7).abs() < 1e-6);
        assert_eq!(fix.sats, Some(5));
    }

    #[test]
    fn no_fix_sentence_marks_fix_invalid() {
        let mut p = NmeaParser::new();
        p.push_data(GGA);
        p.take_fix();
        p.push_data(GGA_NO_FIX);
        let fix = p.take_fix().unwrap();
        assert!(!fix.valid);
        assert_eq!(fix.sats, Some(0));
    }

    #[test]
    fn sentence_split_across_chunks() {
        let mut p = NmeaParser::new();
        let (a, b) = GGA.split_at(20);
        p.push_data(a);
        assert!(p.take_fix().is_none());
        p.push_data(b);
        assert!(p.take_fix().is_some());
    }

    #[test]
    fn bad_checksum_is_counted_and_dropped() {
        let mut p = NmeaParser::new();
        p.push_data(b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*48\r\n");
        assert!(p.take_fix().is_none());
        assert_eq!(p.stats().checksum_errors, 1);
    }

    #[test]
    fn line_noise_before_sentence_is_discarded() {
        let mut p = NmeaParser::new();
        p.push_data(b"\x00\xffgarbage");
        p.push_data(GGA);
        assert!(p.take_fix().is_some());
    }

    #[test]
    fn overlong_line_is_frame_error() {
        let mut p = NmeaParser::new();
        p.push_data(&[b'A'; 200]);
        assert!(p.stats().frame_errors > 0);
        p.push_data(GGA);
        assert!(p.take_fix().is_some());
    }

    #[test]
    fn unknown_sentences_are_counted() {
        let mut p = NmeaParser::new();
        p.push_data(b"$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1*39\r\n");
        assert_eq!(p.stats().sentences_rx, 1);
        assert_eq!(p.stats().unknown_count, 1);
    }

    #[test]
    fn receiver_timeout_invalidates_fix() {
        let mut p = NmeaParser::new();
        p.update_timing(0, GGA.len());
        p.push_data(GGA);
        assert_eq!(p.state(), ReceiverState::Detected);

        p.update_timing(100, 0);
        assert_eq!(p.state(), ReceiverState::ReceivingData);

        assert!(p.take_fix().unwrap().valid);

        p.update_timing(2_600, 0);
        assert_eq!(p.state(), ReceiverState::LostCommunication);
        assert!(!p.latest_fix().valid);
        assert!(!p.take_fix().unwrap().valid);
        assert_eq!(p.stats().timeouts, 1);

        p.update_timing(2_700, 10);
        assert_eq!(p.state(), ReceiverState::Detected);
    }
}
