//! Status bitmask, recomputed every 250 ms into the attitude domain.
//!
//! | bit | meaning                                   |
//! |-----|-------------------------------------------|
//! | 0   | GPS ground track updated within 3 s       |
//! | 1   | IMU in use (enabled and connected)        |
//! | 2   | pressure sensor in use                    |
//! | 3   | calibration in progress                   |
//! | 4   | analysis log open (only with bit 1)       |

use embassy_time::{Duration, Instant, Ticker};

use crate::ahrs::AhrsCore;

pub const GPS_VALID: u8 = 1 << 0;
pub const IMU_IN_USE: u8 = 1 << 1;
pub const BARO_IN_USE: u8 = 1 << 2;
pub const CALIBRATING: u8 = 1 << 3;
pub const LOGGING: u8 = 1 << 4;

pub struct StatusConfig {
    pub period: Duration,
    /// Same staleness window the fusion loop applies to wind.
    pub track_window: Duration,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(250),
            track_window: Duration::from_secs(3),
        }
    }
}

pub fn status_bits(core: &AhrsCore, now: Instant, track_window: Duration) -> u8 {
    let imu = core.imu.in_use();
    let mut bits = 0;
    if core.situation.navigation().track_is_fresh(now, track_window) {
        bits |= GPS_VALID;
    }
    if imu {
        bits |= IMU_IN_USE;
    }
    if core.baro.in_use() {
        bits |= BARO_IN_USE;
    }
    if core.cage.is_calibrating() {
        bits |= CALIBRATING;
    }
    if imu && core.is_logging() {
        bits |= LOGGING;
    }
    bits
}

pub async fn status_task(core: &AhrsCore, config: StatusConfig) -> ! {
    let mut ticker = Ticker::every(config.period);
    loop {
        let bits = status_bits(core, Instant::now(), config.track_window);
        core.situation.update_attitude(|a| a.status = bits);
        ticker.next().await;
    }
}
