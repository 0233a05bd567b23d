//! Sensor-fusion core of an attitude and heading reference.
//!
//! Keeps a barometer and a 9-axis IMU connected, turns their readings into
//! the aircraft body frame, drives an external fusion algorithm at 20 Hz and
//! publishes attitude, heading and vertical speed into a [`SituationStore`].
//!
//! Each loop is a generic `async fn`; a firmware wraps them in concrete
//! executor tasks:
//!
//! ```ignore
//! static AHRS: AhrsCore = AhrsCore::new(true, true);
//! static BARO: Handoff<Bmp388<I2cBus>> = Handoff::new();
//! static IMU: Handoff<Mpu9250<I2cBus>> = Handoff::new();
//!
//! // at startup, before spawning
//! AHRS.load_orientation(&mut settings);
//!
//! #[embassy_executor::task]
//! async fn supervisor(bus: &'static SharedI2c) -> ! {
//!     supervisor_task(&AHRS, BaroPort(bus), &BARO, ImuPort(bus), &IMU, Default::default()).await
//! }
//!
//! #[embassy_executor::task]
//! async fn baro() -> ! {
//!     baro_task(&AHRS, &BARO, Default::default()).await
//! }
//!
//! #[embassy_executor::task]
//! async fn fusion() -> ! {
//!     FusionTask::new(&AHRS, SimpleAhrs::new(), GdlReporter::new())
//!         .run(&IMU)
//!         .await
//! }
//!
//! #[embassy_executor::task]
//! async fn status() -> ! {
//!     status_task(&AHRS, Default::default()).await
//! }
//! ```

#![cfg_attr(not(test), no_std)]

mod logging;

pub mod ahrs;
pub mod cage;
pub mod config;
pub mod error;
pub mod filter;
pub mod frame;
pub mod fusion;
pub mod outputs;
pub mod sensors;
pub mod state;
pub mod tasks;

pub use ahrs::AhrsCore;
pub use cage::Cage;
pub use config::{load_orientation, OrientationConfig, OrientationStore};
pub use error::{CageError, ConfigError, FrameError, LogError, SensorError, TelemetryError};
pub use frame::{dominant_axis, SensorFrame};
pub use fusion::{FusionAlgorithm, Measurement};
pub use sensors::{Barometer, Imu, ImuSample};
pub use state::{SensorLink, SituationStore};
pub use tasks::baro_task::{baro_task, run_baro_session, BaroConfig};
pub use tasks::fusion_loop::{FusionConfig, FusionTask};
pub use tasks::status_task::{status_bits, status_task, StatusConfig};
pub use tasks::supervisor::{supervisor_task, SupervisorConfig};
pub use tasks::{Handoff, SessionEnd};
