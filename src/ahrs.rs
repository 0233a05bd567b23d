use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::cage::Cage;
use crate::config::{self, OrientationConfig, OrientationStore};
use crate::state::{SensorLink, SituationStore};

/// Everything the AHRS loops share: the published situation, per-sensor link
/// state, the cage inlet, the mounting orientation and the analysis-log
/// switch.
///
/// `const`-constructible so a firmware can keep it in a `static`.
pub struct AhrsCore {
    pub situation: SituationStore,
    pub baro: SensorLink,
    pub imu: SensorLink,
    pub cage: Cage,
    orientation: Mutex<CriticalSectionRawMutex, Cell<OrientationConfig>>,
    log_wanted: AtomicBool,
    logging: AtomicBool,
}

impl AhrsCore {
    pub const fn new(baro_enabled: bool, imu_enabled: bool) -> Self {
        Self {
            situation: SituationStore::new(),
            baro: SensorLink::new(baro_enabled),
            imu: SensorLink::new(imu_enabled),
            cage: Cage::new(),
            orientation: Mutex::new(Cell::new(OrientationConfig::DEFAULT)),
            log_wanted: AtomicBool::new(false),
            logging: AtomicBool::new(false),
        }
    }

    pub fn orientation(&self) -> OrientationConfig {
        self.orientation.lock(Cell::get)
    }

    /// Replaces the mounting orientation. Takes effect the next time the
    /// fusion loop rebuilds its frame (new connection or recalibration).
    pub fn set_orientation(&self, cfg: OrientationConfig) {
        self.orientation.lock(|c| c.set(cfg));
    }

    /// Startup: applies the stored orientation, persisting the default when
    /// none is stored yet.
    pub fn load_orientation<S: OrientationStore>(&self, store: &mut S) -> OrientationConfig {
        let cfg = config::load_orientation(store);
        self.set_orientation(cfg);
        cfg
    }

    /// Operator setting: record analysis logs while the IMU is in use.
    pub fn set_analysis_log(&self, wanted: bool) {
        self.log_wanted.store(wanted, Ordering::Relaxed);
    }

    pub fn analysis_log_wanted(&self) -> bool {
        self.log_wanted.load(Ordering::Relaxed)
    }

    /// An analysis log is currently open.
    pub fn is_logging(&self) -> bool {
        self.logging.load(Ordering::Relaxed)
    }

    pub(crate) fn set_logging(&self, logging: bool) {
        self.logging.store(logging, Ordering::Relaxed);
    }
}

impl Default for AhrsCore {
    fn default() -> Self {
        Self::new(true, true)
    }
}
