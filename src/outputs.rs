//! Collaborators fed by the fusion loop: the outbound attitude report, the
//! debug telemetry listener and the analysis log.

use core::fmt::Write;
use core::marker::PhantomData;

use crate::error::{LogError, TelemetryError};
use crate::fusion::Measurement;
use crate::state::SituationStore;

/// Analysis logging stops once resource usage reaches this fraction.
pub const LOG_HEADROOM: f32 = 0.95;

/// Outbound attitude encoder (GDL90 AHRS message or similar).
///
/// Called once per fusion cycle whether or not the solution is valid; the
/// encoder decides how to flag stale data.
pub trait AttitudeReporter {
    fn report(&mut self, situation: &SituationStore);
}

/// Debug listener receiving the estimator's internal state.
pub trait TelemetryListener<S> {
    fn send(&mut self, state: &S, m: &Measurement) -> Result<(), TelemetryError>;
}

/// Placeholder for a fusion loop built without a telemetry listener.
pub enum NoTelemetry {}

impl<S> TelemetryListener<S> for NoTelemetry {
    fn send(&mut self, _state: &S, _m: &Measurement) -> Result<(), TelemetryError> {
        match *self {}
    }
}

/// An open analysis log; one record per fusion cycle.
pub trait AnalysisLog<S> {
    fn append(&mut self, m: &Measurement, state: &S) -> Result<(), LogError>;
}

/// Creates analysis logs. Dropping the returned log closes it.
pub trait AnalysisLogFactory<S> {
    type Log: AnalysisLog<S>;

    fn open(&mut self, file_name: &str) -> Result<Self::Log, LogError>;
}

/// Placeholder for a fusion loop built without analysis logging.
pub enum NoAnalysisLog {}

impl<S> AnalysisLog<S> for NoAnalysisLog {
    fn append(&mut self, _m: &Measurement, _state: &S) -> Result<(), LogError> {
        match *self {}
    }
}

impl<S> AnalysisLogFactory<S> for NoAnalysisLog {
    type Log = NoAnalysisLog;

    fn open(&mut self, _file_name: &str) -> Result<NoAnalysisLog, LogError> {
        match *self {}
    }
}

/// Calendar time, UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

pub trait WallClock {
    fn now(&self) -> CivilTime;
}

/// Reports how loaded the host is (CPU, storage), as a fraction in 0..=1.
pub trait ResourceMonitor {
    fn usage(&self) -> f32;
}

/// `sensors_YYYYMMDD_HHMMSS.csv`
pub fn analysis_log_name(t: &CivilTime) -> heapless::String<32> {
    let mut name = heapless::String::new();
    let _ = write!(
        name,
        "sensors_{:04}{:02}{:02}_{:02}{:02}{:02}.csv",
        t.year, t.month, t.day, t.hour, t.minute, t.second
    );
    name
}

/// Opens an analysis log lazily and appends to it while logging is wanted and
/// there is headroom; closes it otherwise.
pub struct AnalysisRecorder<'a, S, G: AnalysisLogFactory<S>> {
    factory: G,
    clock: &'a dyn WallClock,
    usage: &'a dyn ResourceMonitor,
    log: Option<G::Log>,
    _state: PhantomData<fn(&S)>,
}

impl<'a, S, G: AnalysisLogFactory<S>> AnalysisRecorder<'a, S, G> {
    pub fn new(factory: G, clock: &'a dyn WallClock, usage: &'a dyn ResourceMonitor) -> Self {
        Self {
            factory,
            clock,
            usage,
            log: None,
            _state: PhantomData,
        }
    }

    pub fn is_active(&self) -> bool {
        self.log.is_some()
    }

    /// Drops the open log, if any.
    pub fn close(&mut self) {
        if self.log.take().is_some() {
            crate::log_info!("AHRS Info: analysis log closed");
        }
    }

    /// Runs once per fusion cycle. Returns whether a log is open afterwards.
    pub fn step(&mut self, wanted: bool, m: &Measurement, state: &S) -> bool {
        if !wanted || self.usage.usage() >= LOG_HEADROOM {
            self.close();
            return false;
        }

        if self.log.is_none() {
            let name = analysis_log_name(&self.clock.now());
            match self.factory.open(&name) {
                Ok(log) => {
                    crate::log_info!("AHRS Info: analysis log opened: {}", name.as_str());
                    self.log = Some(log);
                }
                Err(e) => crate::log_error!("AHRS Error: {}: {}", e, name.as_str()),
            }
        }

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.append(m, state) {
                crate::log_warn!("AHRS Error: {}", e);
            }
        }
        self.log.is_some()
    }
}
