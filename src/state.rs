//! Shared situation published by the sensor loops.
//!
//! Each domain sits behind its own mutex so a stall in one loop never holds up
//! readers or writers of another. Access is closure-scoped: the lock is held
//! only while the closure runs and never across sensor I/O.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant};

// ── Data types ────────────────────────────────────────────────────────────────

/// Written only by the baro task.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BaroSituation {
    pub last_measurement: Option<Instant>,
    pub temperature_c: f32,
    pub pressure_altitude_ft: f32,
    /// ft/min
    pub vertical_speed_fpm: f32,
}

impl BaroSituation {
    pub const fn new() -> Self {
        Self {
            last_measurement: None,
            temperature_c: 0.0,
            pressure_altitude_ft: 0.0,
            vertical_speed_fpm: 0.0,
        }
    }
}

/// Written by the fusion loop (attitude) and the status task (`status`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttitudeSituation {
    pub last_attitude: Option<Instant>,
    pub roll_deg: f32,
    pub pitch_deg: f32,
    pub gyro_heading_deg: f32,
    pub mag_heading: f32,
    pub slip_skid: f32,
    pub turn_rate: f32,
    pub g_load: f32,
    /// See [`crate::tasks::status_task`] for the bit layout.
    pub status: u8,
}

impl AttitudeSituation {
    pub const fn new() -> Self {
        Self {
            last_attitude: None,
            roll_deg: 0.0,
            pitch_deg: 0.0,
            gyro_heading_deg: 0.0,
            mag_heading: 0.0,
            slip_skid: 0.0,
            turn_rate: 0.0,
            g_load: 0.0,
            status: 0,
        }
    }
}

/// GPS-derived inputs supplied by the navigation subsystem; read-only here.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NavigationInputs {
    pub last_ground_track: Option<Instant>,
    pub ground_speed_kts: f32,
    pub true_course_deg: f32,
    /// ft/s
    pub vertical_speed_fps: f32,
}

impl NavigationInputs {
    pub const fn new() -> Self {
        Self {
            last_ground_track: None,
            ground_speed_kts: 0.0,
            true_course_deg: 0.0,
            vertical_speed_fps: 0.0,
        }
    }

    /// Ground track updated less than `window` before `now`.
    pub fn track_is_fresh(&self, now: Instant, window: Duration) -> bool {
        match self.last_ground_track {
            Some(t) => now.checked_duration_since(t).map_or(true, |age| age < window),
            None => false,
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

type Domain<T> = Mutex<CriticalSectionRawMutex, Cell<T>>;

fn modify<T: Copy, R>(domain: &Domain<T>, f: impl FnOnce(&mut T) -> R) -> R {
    domain.lock(|cell| {
        let mut v = cell.get();
        let r = f(&mut v);
        cell.set(v);
        r
    })
}

pub struct SituationStore {
    baro: Domain<BaroSituation>,
    attitude: Domain<AttitudeSituation>,
    navigation: Domain<NavigationInputs>,
}

impl SituationStore {
    pub const fn new() -> Self {
        Self {
            baro: Mutex::new(Cell::new(BaroSituation::new())),
            attitude: Mutex::new(Cell::new(AttitudeSituation::new())),
            navigation: Mutex::new(Cell::new(NavigationInputs::new())),
        }
    }

    /// Consistent copy of the baro domain.
    pub fn baro(&self) -> BaroSituation {
        self.baro.lock(Cell::get)
    }

    pub fn update_baro<R>(&self, f: impl FnOnce(&mut BaroSituation) -> R) -> R {
        modify(&self.baro, f)
    }

    /// Consistent copy of the attitude domain.
    pub fn attitude(&self) -> AttitudeSituation {
        self.attitude.lock(Cell::get)
    }

    pub fn update_attitude<R>(&self, f: impl FnOnce(&mut AttitudeSituation) -> R) -> R {
        modify(&self.attitude, f)
    }

    pub fn navigation(&self) -> NavigationInputs {
        self.navigation.lock(Cell::get)
    }

    /// Entry point for the navigation subsystem.
    pub fn update_navigation<R>(&self, f: impl FnOnce(&mut NavigationInputs) -> R) -> R {
        modify(&self.navigation, f)
    }
}

impl Default for SituationStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sensor links ──────────────────────────────────────────────────────────────

/// Enabled setting and connection state of one sensor.
///
/// `connected` is set by the supervisor and cleared by the sample loop that
/// gives up on the device.
pub struct SensorLink {
    enabled: AtomicBool,
    connected: AtomicBool,
}

impl SensorLink {
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            connected: AtomicBool::new(false),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Enabled and connected.
    pub fn in_use(&self) -> bool {
        self.is_enabled() && self.is_connected()
    }

    /// Enabled but waiting for a (re)connection.
    pub fn wants_connection(&self) -> bool {
        self.is_enabled() && !self.is_connected()
    }
}
