//! Error types shared by the sensor, persistence and output collaborators.

use core::fmt;

/// Failure reported by a sensor driver.
///
/// Drivers map their bus- or chip-specific errors onto these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transaction failed (NACK, arbitration, transfer error)
    Bus,
    /// Device answered with an unexpected identity
    WrongDevice,
    /// Device has no fresh sample
    NotReady,
    /// Calibration routine did not converge
    Calibration,
    /// Any other driver-specific failure
    Device,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Bus => write!(f, "bus error"),
            SensorError::WrongDevice => write!(f, "unexpected device id"),
            SensorError::NotReady => write!(f, "no sample ready"),
            SensorError::Calibration => write!(f, "calibration failed"),
            SensorError::Device => write!(f, "device error"),
        }
    }
}

/// Failure persisting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Backing storage rejected the write
    Storage,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Storage => write!(f, "configuration storage error"),
        }
    }
}

/// Failure delivering debug telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Listener went away
    Disconnected,
    /// Transport refused the frame
    SendFailed,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Disconnected => write!(f, "telemetry listener disconnected"),
            TelemetryError::SendFailed => write!(f, "telemetry send failed"),
        }
    }
}

/// Failure opening or writing an analysis log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogError {
    /// Log file could not be created
    Open,
    /// Record could not be appended
    Write,
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Open => write!(f, "could not open analysis log"),
            LogError::Write => write!(f, "could not write analysis log"),
        }
    }
}

/// Failure of a bounded recalibration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CageError {
    /// Fusion loop did not pick the request up in time
    Timeout,
}

impl fmt::Display for CageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CageError::Timeout => write!(f, "fusion loop did not accept cage request"),
        }
    }
}

/// Invalid sensor orientation selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Selector outside ±1..±3
    OutOfRange(i8),
    /// Forward and up select the same physical axis
    SameAxis,
    /// No single axis dominates the acceleration vector
    Ambiguous,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::OutOfRange(v) => write!(f, "axis selector {} out of range", v),
            FrameError::SameAxis => write!(f, "forward and up select the same axis"),
            FrameError::Ambiguous => write!(f, "no dominant acceleration axis"),
        }
    }
}
