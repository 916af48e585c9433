use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_time::{Duration, Ticker};

use crate::drivers::ble::BleRadio;
use crate::drivers::nmea::NmeaParser;
use crate::error::SensorError;
use crate::state::{AccelSample, GeoFix, TelemetrySnapshot};
use crate::telemetry::TelemetryNode;

/// Non-blocking accelerometer poll.
pub trait AccelSource {
    fn read_sample(&mut self) -> Result<AccelSample, SensorError>;
}

/// Non-blocking poll for a fix decoded since the previous call.
pub trait FixSource {
    fn poll_fix(&mut self) -> Option<GeoFix>;
}

impl FixSource for NmeaParser {
    fn poll_fix(&mut self) -> Option<GeoFix> {
        self.take_fix()
    }
}

impl<M: RawMutex, const N: usize> FixSource for Receiver<'_, M, GeoFix, N> {
    fn poll_fix(&mut self) -> Option<GeoFix> {
        self.try_receive().ok()
    }
}

/// Acquisition loop at the node's tick rate.
/// Publishes a snapshot per tick on `snapshot_tx`; with capacity 1 a busy
/// consumer misses frames rather than stalling the tick.
pub async fn acquisition_task<R, A, F, M, const N: usize>(
    mut node: TelemetryNode<R>,
    mut accel: A,
    mut gps: F,
    snapshot_tx: Sender<'_, M, TelemetrySnapshot, N>,
) where
    R: BleRadio,
    A: AccelSource,
    F: FixSource,
    M: RawMutex,
{
    let period = Duration::from_millis(node.config().tick_period_ms);
    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;
        run_tick(&mut node, super::now_ms(), &mut accel, &mut gps, &snapshot_tx);
    }
}

/// One tick of [`acquisition_task`], clock supplied by the caller.
pub fn run_tick<R, A, F, M, const N: usize>(
    node: &mut TelemetryNode<R>,
    now_ms: u32,
    accel: &mut A,
    gps: &mut F,
    snapshot_tx: &Sender<'_, M, TelemetrySnapshot, N>,
) -> TelemetrySnapshot
where
    R: BleRadio,
    A: AccelSource,
    F: FixSource,
    M: RawMutex,
{
    let sample = match accel.read_sample() {
        Ok(sample) => Some(sample),
        Err(SensorError::NotReady) => None,
        Err(e) => {
            crate::log_debug!("IMU read: {}", e);
            None
        }
    };
    let fix = gps.poll_fix();

    node.tick(now_ms, sample, fix);
    let snapshot = node.snapshot(now_ms);
    let _ = snapshot_tx.try_send(snapshot);
    snapshot
}
