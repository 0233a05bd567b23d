//! Scripted sensors and collaborators shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use attitude_core::outputs::{
    AnalysisLog, AnalysisLogFactory, AttitudeReporter, CivilTime, ResourceMonitor,
    TelemetryListener, WallClock,
};
use attitude_core::sensors::{BarometerConnector, ImuConnector};
use attitude_core::tasks::supervisor::connect_imu;
use attitude_core::{
    AhrsCore, Barometer, FusionAlgorithm, Handoff, Imu, ImuSample, LogError, Measurement,
    SensorError, SituationStore, SupervisorConfig, TelemetryError,
};
use embassy_futures::block_on;
use embassy_time::Duration;

// ── IMU ───────────────────────────────────────────────────────────────────────

pub struct ImuRig {
    pub sample: Cell<ImuSample>,
    pub read_fails: Cell<bool>,
    pub mag_fails: Cell<bool>,
    /// Upcoming calibrations that fail before they start succeeding
    pub calibration_failures: Cell<u32>,
    pub connects: Cell<u32>,
    pub reads: Cell<u32>,
    pub calibrations: Cell<u32>,
    pub closes: Cell<u32>,
}

impl ImuRig {
    pub fn new() -> Self {
        Self {
            sample: Cell::new(ImuSample {
                accel: [0.0, 0.0, -1.0],
                gyro: [0.0, 0.0, 0.0],
                mag: Ok([0.3, 0.0, 0.5]),
            }),
            read_fails: Cell::new(false),
            mag_fails: Cell::new(false),
            calibration_failures: Cell::new(0),
            connects: Cell::new(0),
            reads: Cell::new(0),
            calibrations: Cell::new(0),
            closes: Cell::new(0),
        }
    }
}

pub struct RigImu<'a>(&'a ImuRig);

impl Imu for RigImu<'_> {
    async fn read(&mut self) -> Result<ImuSample, SensorError> {
        let rig = self.0;
        rig.reads.set(rig.reads.get() + 1);
        if rig.read_fails.get() {
            return Err(SensorError::Bus);
        }
        let mut s = rig.sample.get();
        if rig.mag_fails.get() {
            s.mag = Err(SensorError::Device);
        }
        Ok(s)
    }

    async fn calibrate(&mut self, _duration_s: u8, _retries: u8) -> Result<(), SensorError> {
        let rig = self.0;
        rig.calibrations.set(rig.calibrations.get() + 1);
        match rig.calibration_failures.get() {
            0 => Ok(()),
            n => {
                rig.calibration_failures.set(n - 1);
                Err(SensorError::Calibration)
            }
        }
    }

    async fn close(&mut self) {
        self.0.closes.set(self.0.closes.get() + 1);
    }
}

pub struct RigImuPort<'a>(pub &'a ImuRig);

impl<'a> ImuConnector for RigImuPort<'a> {
    type Driver = RigImu<'a>;

    async fn connect(&mut self) -> Result<RigImu<'a>, SensorError> {
        self.0.connects.set(self.0.connects.get() + 1);
        Ok(RigImu(self.0))
    }
}

// ── Barometer ─────────────────────────────────────────────────────────────────

pub struct BaroRig {
    pub present: Cell<bool>,
    pub pressure_fails: Cell<bool>,
    pub pressure_hpa: Cell<f32>,
    pub connects: Cell<u32>,
    pub reads: Cell<u32>,
    pub closes: Cell<u32>,
}

impl BaroRig {
    pub fn new() -> Self {
        Self {
            present: Cell::new(true),
            pressure_fails: Cell::new(false),
            pressure_hpa: Cell::new(1013.25),
            connects: Cell::new(0),
            reads: Cell::new(0),
            closes: Cell::new(0),
        }
    }
}

pub struct RigBaro<'a>(&'a BaroRig);

impl Barometer for RigBaro<'_> {
    async fn temperature(&mut self) -> Result<f32, SensorError> {
        Ok(18.0)
    }

    async fn pressure(&mut self) -> Result<f32, SensorError> {
        let rig = self.0;
        rig.reads.set(rig.reads.get() + 1);
        if rig.pressure_fails.get() {
            Err(SensorError::Bus)
        } else {
            Ok(rig.pressure_hpa.get())
        }
    }

    async fn close(&mut self) {
        self.0.closes.set(self.0.closes.get() + 1);
    }
}

pub struct RigBaroPort<'a>(pub &'a BaroRig);

impl<'a> BarometerConnector for RigBaroPort<'a> {
    type Driver = RigBaro<'a>;

    async fn connect(&mut self) -> Result<RigBaro<'a>, SensorError> {
        self.0.connects.set(self.0.connects.get() + 1);
        if self.0.present.get() {
            Ok(RigBaro(self.0))
        } else {
            Err(SensorError::WrongDevice)
        }
    }
}

// ── Fusion collaborators ──────────────────────────────────────────────────────

pub const ROLL_RAD: f32 = 0.1;

/// Fixed-output fusion algorithm that records what it was fed.
pub struct MockAhrs {
    pub valid: bool,
    pub resets: u32,
    pub computes: u32,
    pub fresh_wind: u32,
    pub last: Measurement,
}

impl MockAhrs {
    pub fn new(valid: bool) -> Self {
        Self {
            valid,
            resets: 0,
            computes: 0,
            fresh_wind: 0,
            last: Measurement::new(),
        }
    }
}

impl FusionAlgorithm for MockAhrs {
    type State = u32;

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn compute(&mut self, m: &Measurement) {
        self.computes += 1;
        if m.wind_valid {
            self.fresh_wind += 1;
        }
        self.last = *m;
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn roll_pitch_heading(&self) -> (f32, f32, f32) {
        (ROLL_RAD, -0.05, 1.0)
    }

    fn mag_heading(&self) -> f32 {
        42.0
    }

    fn slip_skid(&self) -> f32 {
        0.5
    }

    fn rate_of_turn(&self) -> f32 {
        3.0
    }

    fn g_load(&self) -> f32 {
        1.0
    }

    fn state(&self) -> &u32 {
        &self.computes
    }
}

#[derive(Default)]
pub struct CountingReporter {
    pub reports: u32,
}

impl AttitudeReporter for CountingReporter {
    fn report(&mut self, _situation: &SituationStore) {
        self.reports += 1;
    }
}

/// Accepts sends until `fail_on`, which fails.
pub struct FlakyListener<'a> {
    pub sends: &'a Cell<u32>,
    pub fail_on: u32,
}

impl TelemetryListener<u32> for FlakyListener<'_> {
    fn send(&mut self, _state: &u32, _m: &Measurement) -> Result<(), TelemetryError> {
        let n = self.sends.get() + 1;
        self.sends.set(n);
        if n == self.fail_on {
            Err(TelemetryError::SendFailed)
        } else {
            Ok(())
        }
    }
}

// ── Analysis log ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct LogRig {
    pub opened: RefCell<Vec<String>>,
    pub appends: Cell<u32>,
}

pub struct RigLogs<'a>(pub &'a LogRig);

pub struct RigLog<'a>(&'a LogRig);

impl AnalysisLog<u32> for RigLog<'_> {
    fn append(&mut self, _m: &Measurement, _state: &u32) -> Result<(), LogError> {
        self.0.appends.set(self.0.appends.get() + 1);
        Ok(())
    }
}

impl<'a> AnalysisLogFactory<u32> for RigLogs<'a> {
    type Log = RigLog<'a>;

    fn open(&mut self, file_name: &str) -> Result<RigLog<'a>, LogError> {
        self.0.opened.borrow_mut().push(file_name.into());
        Ok(RigLog(self.0))
    }
}

pub struct FixedClock;

impl WallClock for FixedClock {
    fn now(&self) -> CivilTime {
        CivilTime {
            year: 2024,
            month: 3,
            day: 7,
            hour: 9,
            minute: 5,
            second: 1,
        }
    }
}

pub struct Usage(pub Cell<f32>);

impl ResourceMonitor for Usage {
    fn usage(&self) -> f32 {
        self.0.get()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

pub fn quick_supervisor() -> SupervisorConfig {
    SupervisorConfig {
        period: Duration::from_millis(20),
        imu_settle: Duration::from_millis(1),
    }
}

/// Connects and calibrates the rig IMU the way the supervisor does, returning
/// the driver it would hand to the fusion loop.
pub fn connect_rig_imu<'a>(core: &AhrsCore, rig: &'a ImuRig) -> RigImu<'a> {
    let handoff = Handoff::new();
    assert!(block_on(connect_imu(
        core,
        &mut RigImuPort(rig),
        &handoff,
        &quick_supervisor()
    )));
    handoff.try_receive().unwrap()
}
