//! Sensor capability traits.
//!
//! The bus transport and register-level work live in the driver crates; this
//! core only needs the operations below. A connector instantiates a driver,
//! which is then held for the life of the connection.

use crate::error::SensorError;

/// Temperature / static pressure sensor.
#[allow(async_fn_in_trait)]
pub trait Barometer {
    /// Temperature in °C
    async fn temperature(&mut self) -> Result<f32, SensorError>;

    /// Static pressure in hPa
    async fn pressure(&mut self) -> Result<f32, SensorError>;

    /// Release the device. Called once when the connection is dropped.
    async fn close(&mut self);
}

/// One raw 9-axis sample in sensor-native axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Specific force, g
    pub accel: [f32; 3],
    /// Angular rate, deg/s
    pub gyro: [f32; 3],
    /// Magnetic field, µT. A magnetometer fault does not invalidate the
    /// accelerometer and gyro channels.
    pub mag: Result<[f32; 3], SensorError>,
}

/// Accelerometer / gyro / magnetometer package.
#[allow(async_fn_in_trait)]
pub trait Imu {
    /// Reads all channels. `Err` means the accel/gyro read failed.
    async fn read(&mut self) -> Result<ImuSample, SensorError>;

    /// Runs the device's bias calibration.
    async fn calibrate(&mut self, duration_s: u8, retries: u8) -> Result<(), SensorError>;

    async fn close(&mut self);
}

/// Instantiates a barometer driver.
#[allow(async_fn_in_trait)]
pub trait BarometerConnector {
    type Driver: Barometer;

    async fn connect(&mut self) -> Result<Self::Driver, SensorError>;
}

/// Instantiates an IMU driver.
#[allow(async_fn_in_trait)]
pub trait ImuConnector {
    type Driver: Imu;

    async fn connect(&mut self) -> Result<Self::Driver, SensorError>;
}

/// Driver of whichever device family answered.
pub enum Either<A, B> {
    Primary(A),
    Secondary(B),
}

impl<A: Barometer, B: Barometer> Barometer for Either<A, B> {
    async fn temperature(&mut self) -> Result<f32, SensorError> {
        match self {
            Either::Primary(a) => a.temperature().await,
            Either::Secondary(b) => b.temperature().await,
        }
    }

    async fn pressure(&mut self) -> Result<f32, SensorError> {
        match self {
            Either::Primary(a) => a.pressure().await,
            Either::Secondary(b) => b.pressure().await,
        }
    }

    async fn close(&mut self) {
        match self {
            Either::Primary(a) => a.close().await,
            Either::Secondary(b) => b.close().await,
        }
    }
}

impl<A: Imu, B: Imu> Imu for Either<A, B> {
    async fn read(&mut self) -> Result<ImuSample, SensorError> {
        match self {
            Either::Primary(a) => a.read().await,
            Either::Secondary(b) => b.read().await,
        }
    }

    async fn calibrate(&mut self, duration_s: u8, retries: u8) -> Result<(), SensorError> {
        match self {
            Either::Primary(a) => a.calibrate(duration_s, retries).await,
            Either::Secondary(b) => b.calibrate(duration_s, retries).await,
        }
    }

    async fn close(&mut self) {
        match self {
            Either::Primary(a) => a.close().await,
            Either::Secondary(b) => b.close().await,
        }
    }
}

/// Tries `primary` first, then `secondary`.
pub struct Fallback<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A, B> Fallback<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: BarometerConnector, B: BarometerConnector> BarometerConnector for Fallback<A, B> {
    type Driver = Either<A::Driver, B::Driver>;

    async fn connect(&mut self) -> Result<Self::Driver, SensorError> {
        match self.primary.connect().await {
            Ok(d) => Ok(Either::Primary(d)),
            Err(e) => {
                crate::log_debug!("AHRS Info: primary barometer failed ({}), trying secondary", e);
                self.secondary.connect().await.map(Either::Secondary)
            }
        }
    }
}

impl<A: ImuConnector, B: ImuConnector> ImuConnector for Fallback<A, B> {
    type Driver = Either<A::Driver, B::Driver>;

    async fn connect(&mut self) -> Result<Self::Driver, SensorError> {
        match self.primary.connect().await {
            Ok(d) => Ok(Either::Primary(d)),
            Err(e) => {
                crate::log_debug!("AHRS Info: primary IMU failed ({}), trying secondary", e);
                self.secondary.connect().await.map(Either::Secondary)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    struct FixedBaro(f32);

    impl Barometer for FixedBaro {
        async fn temperature(&mut self) -> Result<f32, SensorError> {
            Ok(15.0)
        }

        async fn pressure(&mut self) -> Result<f32, SensorError> {
            Ok(self.0)
        }

        async fn close(&mut self) {}
    }

    struct Connector(Option<f32>);

    impl BarometerConnector for Connector {
        type Driver = FixedBaro;

        async fn connect(&mut self) -> Result<FixedBaro, SensorError> {
            self.0.map(FixedBaro).ok_or(SensorError::WrongDevice)
        }
    }

    #[test]
    fn test_fallback_prefers_primary() {
        let mut c = Fallback::new(Connector(Some(1000.0)), Connector(Some(900.0)));
        let mut d = block_on(c.connect()).unwrap();
        assert!(matches!(d, Either::Primary(_)));
        assert_eq!(block_on(d.pressure()), Ok(1000.0));
    }

    #[test]
    fn test_fallback_uses_secondary() {
        let mut c = Fallback::new(Connector(None), Connector(Some(900.0)));
        let mut d = block_on(c.connect()).unwrap();
        assert!(matches!(d, Either::Secondary(_)));
        assert_eq!(block_on(d.pressure()), Ok(900.0));
    }

    #[test]
    fn test_fallback_both_fail() {
        let mut c = Fallback::new(Connector(None), Connector(None));
        assert!(matches!(block_on(c.connect()), Err(SensorError::WrongDevice)));
    }
}
