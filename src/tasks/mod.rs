//! Periodic loops. Each runs on its own ticker and talks to the others only
//! through [`crate::AhrsCore`] and the driver handoff channels.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

pub mod baro_task;
pub mod fusion_loop;
pub mod status_task;
pub mod supervisor;

/// Consecutive read failures tolerated before a sensor is dropped; the next
/// one disconnects it.
pub const MAX_READ_RETRIES: u8 = 5;

/// Passes a freshly connected driver from the supervisor to its sample loop.
pub type Handoff<T> = Channel<CriticalSectionRawMutex, T, 1>;

/// Why a sample loop let go of its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEnd {
    /// Sensor was disabled by the operator
    Disabled,
    /// Too many consecutive read failures
    Failed,
}
