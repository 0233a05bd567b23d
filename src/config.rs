//! Sensor mounting orientation and its persistence.

use crate::error::{ConfigError, FrameError};

/// Forward selector used when none has been configured (board mounted flat,
/// connector facing aft).
pub const DEFAULT_FORWARD: i8 = -1;
/// Up selector used when none has been configured.
pub const DEFAULT_UP: i8 = -3;

/// Mounting of the IMU relative to the airframe.
///
/// Each selector names a sensor axis (1 = x, 2 = y, 3 = z); the sign gives the
/// direction. Zero means "not configured".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OrientationConfig {
    pub forward: i8,
    pub up: i8,
}

impl OrientationConfig {
    /// Both selectors unset.
    pub const UNSET: Self = Self { forward: 0, up: 0 };

    /// Reference orientation applied when nothing is configured.
    pub const DEFAULT: Self = Self {
        forward: DEFAULT_FORWARD,
        up: DEFAULT_UP,
    };

    /// Validated orientation, for explicit reconfiguration.
    pub fn new(forward: i8, up: i8) -> Result<Self, FrameError> {
        let cfg = Self { forward, up };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn is_unset(&self) -> bool {
        self.forward == 0 || self.up == 0
    }

    /// Checks range and that forward and up pick different physical axes.
    pub fn validate(&self) -> Result<(), FrameError> {
        for sel in [self.forward, self.up] {
            if sel == 0 || !(-3..=3).contains(&sel) {
                return Err(FrameError::OutOfRange(sel));
            }
        }
        if self.forward.unsigned_abs() == self.up.unsigned_abs() {
            return Err(FrameError::SameAxis);
        }
        Ok(())
    }
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Persistent storage for the two orientation selectors.
pub trait OrientationStore {
    fn load(&mut self) -> OrientationConfig;
    fn save(&mut self, cfg: OrientationConfig) -> Result<(), ConfigError>;
}

/// Reads the stored orientation, writing the default back when unset.
///
/// A failed write is logged; the default is still used for this session.
pub fn load_orientation<S: OrientationStore>(store: &mut S) -> OrientationConfig {
    let cfg = store.load();
    if !cfg.is_unset() {
        return cfg;
    }

    crate::log_info!(
        "AHRS Info: orientation unset, defaulting to forward={} up={}",
        DEFAULT_FORWARD,
        DEFAULT_UP
    );
    if let Err(e) = store.save(OrientationConfig::DEFAULT) {
        crate::log_error!("AHRS Error: couldn't persist default orientation: {}", e);
    }
    OrientationConfig::DEFAULT
}

/// In-memory store, handy for boards without settings flash and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryOrientationStore {
    cfg: Option<OrientationConfig>,
    writes: u32,
}

impl MemoryOrientationStore {
    pub const fn new() -> Self {
        Self { cfg: None, writes: 0 }
    }

    pub const fn with(cfg: OrientationConfig) -> Self {
        Self {
            cfg: Some(cfg),
            writes: 0,
        }
    }

    /// Number of successful saves.
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl OrientationStore for MemoryOrientationStore {
    fn load(&mut self) -> OrientationConfig {
        self.cfg.unwrap_or(OrientationConfig::UNSET)
    }

    fn save(&mut self, cfg: OrientationConfig) -> Result<(), ConfigError> {
        self.cfg = Some(cfg);
        self.writes += 1;
        Ok(())
    }
}
