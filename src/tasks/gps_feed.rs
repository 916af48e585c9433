use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};

use crate::drivers::nmea::NmeaParser;
use crate::error::SensorError;
use crate::state::GeoFix;

/// Receiver at 10 Hz sends a burst every 100 ms; wait slightly longer.
const BURST_WINDOW_MS: u64 = 110;

/// UART side of the GPS receiver.
#[allow(async_fn_in_trait)]
pub trait SerialRead {
    /// Read until the line goes idle; returns bytes written into `buf`.
    async fn read_until_idle(&mut self, buf: &mut [u8]) -> Result<usize, SensorError>;
}

/// Feed one burst (possibly empty) into the parser and return any new fix.
pub fn process_burst(parser: &mut NmeaParser, now_ms: u32, bytes: &[u8]) -> Option<GeoFix> {
    parser.update_timing(now_ms, bytes.len());
    parser.push_data(bytes);
    parser.take_fix()
}

/// Reads NMEA from `serial` and forwards each new fix on `fix_tx`.
pub async fn gps_feed_task<S, M, const N: usize>(
    mut serial: S,
    mut parser: NmeaParser,
    fix_tx: Sender<'_, M, GeoFix, N>,
) where
    S: SerialRead,
    M: RawMutex,
{
    let mut buf = [0u8; 512];

    loop {
        let n = match select(
            serial.read_until_idle(&mut buf),
            Timer::after(Duration::from_millis(BURST_WINDOW_MS)),
        )
        .await
        {
            Either::First(Ok(n)) => n,
            Either::First(Err(e)) => {
                crate::log_debug!("GPS UART: {}", e);
                0
            }
            Either::Second(_) => 0,
        };

        if let Some(fix) = process_burst(&mut parser, super::now_ms(), &buf[..n]) {
            let _ = fix_tx.try_send(fix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::nmea::ReceiverState;

    const GGA: &[u8] =
        b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

    #[test]
    fn burst_with_gga_yields_fix() {
        let mut parser = NmeaParser::new();
        let fix = process_burst(&mut parser, 0, GGA).unwrap();
        assert!(fix.valid);
        assert_eq!(fix.sats, Some(8));
        assert!(process_burst(&mut parser, 100, &[]).is_none());
    }

    #[test]
    fn silent_receiver_eventually_reports_lost_fix() {
        let mut parser = NmeaParser::new();
        process_burst(&mut parser, 0, GGA);
        process_burst(&mut parser, 100, &[]);
        assert_eq!(parser.state(), ReceiverState::ReceivingData);

        let mut t = 100;
        let lost = loop {
            t += 110;
            if let Some(fix) = process_burst(&mut parser, t, &[]) {
                break fix;
            }
            assert!(t < 5_000);
        };
        assert!(!lost.valid);
        assert_eq!(parser.state(), ReceiverState::LostCommunication);
    }
}
