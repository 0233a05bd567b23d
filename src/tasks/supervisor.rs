use embassy_sync::channel::TrySendError;
use embassy_time::{Duration, Ticker, Timer};

use crate::ahrs::AhrsCore;
use crate::sensors::{Barometer, BarometerConnector, Imu, ImuConnector};
use crate::tasks::Handoff;

/// Initial calibration parameters passed to [`Imu::calibrate`].
pub const CALIBRATION_DURATION_S: u8 = 1;
pub const CALIBRATION_RETRIES: u8 = 1;

pub struct SupervisorConfig {
    /// Interval between reconnection attempts.
    pub period: Duration,
    /// Pause between opening the IMU and calibrating it.
    pub imu_settle: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(4),
            imu_settle: Duration::from_millis(200),
        }
    }
}

// ── Task ─────────────────────────────────────────────────────────────────────

/// Keeps both sensors connected while they are enabled.
///
/// Every `period`, each sensor that is enabled but not connected gets one
/// connection attempt. There is no retry limit here; a sensor that keeps
/// failing is simply tried again next period.
pub async fn supervisor_task<BC, IC>(
    core: &AhrsCore,
    mut baro: BC,
    baro_handoff: &Handoff<BC::Driver>,
    mut imu: IC,
    imu_handoff: &Handoff<IC::Driver>,
    config: SupervisorConfig,
) -> !
where
    BC: BarometerConnector,
    IC: ImuConnector,
{
    let mut ticker = Ticker::every(config.period);
    loop {
        if core.baro.wants_connection() {
            connect_barometer(core, &mut baro, baro_handoff).await;
        }
        if core.imu.wants_connection() {
            connect_imu(core, &mut imu, imu_handoff, &config).await;
        }
        ticker.next().await;
    }
}

/// One barometer connection attempt. Returns whether the sensor is now
/// connected and its driver handed to the baro task.
pub async fn connect_barometer<BC: BarometerConnector>(
    core: &AhrsCore,
    connector: &mut BC,
    handoff: &Handoff<BC::Driver>,
) -> bool {
    let driver = match connector.connect().await {
        Ok(d) => d,
        Err(e) => {
            crate::log_warn!("AHRS Info: couldn't connect to pressure sensor: {}", e);
            return false;
        }
    };

    core.baro.set_connected(true);
    if let Err(TrySendError::Full(mut driver)) = handoff.try_send(driver) {
        // Previous driver not picked up yet; baro task isn't running.
        crate::log_error!("AHRS Error: pressure sensor connected but nothing is reading it");
        driver.close().await;
        core.baro.set_connected(false);
        return false;
    }

    crate::log_info!("AHRS Info: connected to pressure sensor");
    true
}

/// One IMU connection attempt: open, settle, initial calibration.
///
/// The IMU only counts as connected once calibration succeeds; a failed
/// calibration closes the driver and leaves the sensor for the next attempt.
pub async fn connect_imu<IC: ImuConnector>(
    core: &AhrsCore,
    connector: &mut IC,
    handoff: &Handoff<IC::Driver>,
    config: &SupervisorConfig,
) -> bool {
    let mut driver = match connector.connect().await {
        Ok(d) => d,
        Err(e) => {
            crate::log_warn!("AHRS Info: couldn't connect to IMU: {}", e);
            return false;
        }
    };

    Timer::after(config.imu_settle).await;

    core.cage.set_calibrating(true);
    let calibrated = driver
        .calibrate(CALIBRATION_DURATION_S, CALIBRATION_RETRIES)
        .await;
    core.cage.set_calibrating(false);

    if let Err(e) = calibrated {
        crate::log_warn!("AHRS Error: IMU calibration failed: {}", e);
        driver.close().await;
        core.imu.set_connected(false);
        return false;
    }

    core.imu.set_connected(true);
    if let Err(TrySendError::Full(mut driver)) = handoff.try_send(driver) {
        crate::log_error!("AHRS Error: IMU connected but nothing is reading it");
        driver.close().await;
        core.imu.set_connected(false);
        return false;
    }

    crate::log_info!("AHRS Info: IMU connected and calibrated");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::sensors::ImuSample;
    use core::cell::Cell;
    use embassy_futures::block_on;

    struct NullBaro<'a>(&'a Cell<u32>);

    impl Barometer for NullBaro<'_> {
        async fn temperature(&mut self) -> Result<f32, SensorError> {
            Ok(15.0)
        }
        async fn pressure(&mut self) -> Result<f32, SensorError> {
            Ok(1013.25)
        }
        async fn close(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    struct BaroPort<'a> {
        present: bool,
        closes: &'a Cell<u32>,
    }

    impl<'a> BarometerConnector for BaroPort<'a> {
        type Driver = NullBaro<'a>;

        async fn connect(&mut self) -> Result<NullBaro<'a>, SensorError> {
            if self.present {
                Ok(NullBaro(self.closes))
            } else {
                Err(SensorError::Bus)
            }
        }
    }

    struct CalImu<'a> {
        ok: bool,
        calibrations: &'a Cell<u32>,
        closes: &'a Cell<u32>,
    }

    impl Imu for CalImu<'_> {
        async fn read(&mut self) -> Result<ImuSample, SensorError> {
            Err(SensorError::NotReady)
        }
        async fn calibrate(&mut self, duration_s: u8, retries: u8) -> Result<(), SensorError> {
            assert_eq!((duration_s, retries), (1, 1));
            self.calibrations.set(self.calibrations.get() + 1);
            if self.ok {
                Ok(())
            } else {
                Err(SensorError::Calibration)
            }
        }
        async fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    struct ImuPort<'a> {
        calibrates: bool,
        calibrations: &'a Cell<u32>,
        closes: &'a Cell<u32>,
    }

    impl<'a> ImuConnector for ImuPort<'a> {
        type Driver = CalImu<'a>;

        async fn connect(&mut self) -> Result<CalImu<'a>, SensorError> {
            Ok(CalImu {
                ok: self.calibrates,
                calibrations: self.calibrations,
                closes: self.closes,
            })
        }
    }

    fn quick() -> SupervisorConfig {
        SupervisorConfig {
            period: Duration::from_millis(10),
            imu_settle: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_baro_connect_hands_over_driver() {
        let core = AhrsCore::new(true, false);
        let closes = Cell::new(0);
        let handoff: Handoff<NullBaro> = Handoff::new();
        let mut port = BaroPort { present: true, closes: &closes };

        assert!(block_on(connect_barometer(&core, &mut port, &handoff)));
        assert!(core.baro.is_connected());
        assert!(handoff.try_receive().is_ok());
    }

    #[test]
    fn test_baro_absent_stays_disconnected() {
        let core = AhrsCore::new(true, false);
        let closes = Cell::new(0);
        let handoff: Handoff<NullBaro> = Handoff::new();
        let mut port = BaroPort { present: false, closes: &closes };

        assert!(!block_on(connect_barometer(&core, &mut port, &handoff)));
        assert!(!core.baro.is_connected());
        assert!(handoff.try_receive().is_err());
    }

    #[test]
    fn test_baro_unclaimed_handoff_closes_new_driver() {
        let core = AhrsCore::new(true, false);
        let closes = Cell::new(0);
        let handoff: Handoff<NullBaro> = Handoff::new();
        let mut port = BaroPort { present: true, closes: &closes };

        assert!(block_on(connect_barometer(&core, &mut port, &handoff)));
        core.baro.set_connected(false);
        assert!(!block_on(connect_barometer(&core, &mut port, &handoff)));
        assert_eq!(closes.get(), 1);
        assert!(!core.baro.is_connected());
    }

    #[test]
    fn test_imu_connects_after_calibration() {
        let core = AhrsCore::new(false, true);
        let (calibrations, closes) = (Cell::new(0), Cell::new(0));
        let handoff: Handoff<CalImu> = Handoff::new();
        let mut port = ImuPort {
            calibrates: true,
            calibrations: &calibrations,
            closes: &closes,
        };

        assert!(block_on(connect_imu(&core, &mut port, &handoff, &quick())));
        assert!(core.imu.is_connected());
        assert!(!core.cage.is_calibrating());
        assert_eq!(calibrations.get(), 1);
        assert!(handoff.try_receive().is_ok());
    }

    #[test]
    fn test_imu_calibration_failure_discards_driver() {
        let core = AhrsCore::new(false, true);
        let (calibrations, closes) = (Cell::new(0), Cell::new(0));
        let handoff: Handoff<CalImu> = Handoff::new();
        let mut port = ImuPort {
            calibrates: false,
            calibrations: &calibrations,
            closes: &closes,
        };

        assert!(!block_on(connect_imu(&core, &mut port, &handoff, &quick())));
        assert!(!core.imu.is_connected());
        assert!(!core.cage.is_calibrating());
        assert_eq!(closes.get(), 1);
        assert!(handoff.try_receive().is_err());
    }
}
