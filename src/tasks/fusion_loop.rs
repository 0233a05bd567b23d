use embassy_time::{Duration, Instant, Ticker};
use micromath::F32Ext;

use crate::ahrs::AhrsCore;
use crate::frame::SensorFrame;
use crate::fusion::{FusionAlgorithm, Measurement};
use crate::outputs::{
    AnalysisLogFactory, AnalysisRecorder, AttitudeReporter, NoAnalysisLog, NoTelemetry,
    TelemetryListener,
};
use crate::sensors::Imu;
use crate::tasks::supervisor::{CALIBRATION_DURATION_S, CALIBRATION_RETRIES};
use crate::tasks::{Handoff, SessionEnd, MAX_READ_RETRIES};

// ── Unit conversion ───────────────────────────────────────────────────────────

/// ft/min → kt
pub const KNOTS_PER_FPM: f32 = 60.0 / 6076.12;
/// ft/s → kt
pub const KNOTS_PER_FPS: f32 = 3600.0 / 6076.12;

pub struct FusionConfig {
    /// Cycle period. The fusion algorithm needs better than 10 Hz.
    pub period: Duration,
    /// Ground track older than this no longer yields a wind estimate.
    pub wind_window: Duration,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(50),
            wind_window: Duration::from_secs(3),
        }
    }
}

fn seconds(t: Instant) -> f64 {
    t.as_micros() as f64 / 1_000_000.0
}

fn negate(v: [f32; 3]) -> [f32; 3] {
    [-v[0], -v[1], -v[2]]
}

// ── Task ─────────────────────────────────────────────────────────────────────

/// The attitude fusion loop and everything it owns across IMU connections:
/// the fusion algorithm, the protocol reporter, the optional debug listener
/// and the optional analysis log.
///
/// ```ignore
/// let mut fusion = FusionTask::new(&AHRS, SimpleAhrs::new(), GdlReporter::new())
///     .with_telemetry(UdpListener::new(sock))
///     .with_analysis_log(AnalysisRecorder::new(SdLogs::new(card), &RTC, &SD_USAGE));
/// fusion.run(&IMU_HANDOFF).await
/// ```
pub struct FusionTask<'a, A, R, T = NoTelemetry, G = NoAnalysisLog>
where
    A: FusionAlgorithm,
    G: AnalysisLogFactory<A::State>,
{
    core: &'a AhrsCore,
    algorithm: A,
    reporter: R,
    config: FusionConfig,
    telemetry: Option<T>,
    analysis: Option<AnalysisRecorder<'a, A::State, G>>,
    /// Kept between cycles: a stale ground track leaves the last wind in place.
    measurement: Measurement,
}

impl<'a, A, R> FusionTask<'a, A, R>
where
    A: FusionAlgorithm,
    R: AttitudeReporter,
{
    pub fn new(core: &'a AhrsCore, algorithm: A, reporter: R) -> Self {
        Self {
            core,
            algorithm,
            reporter,
            config: FusionConfig::default(),
            telemetry: None,
            analysis: None,
            measurement: Measurement::new(),
        }
    }
}

impl<'a, A, R, T, G> FusionTask<'a, A, R, T, G>
where
    A: FusionAlgorithm,
    R: AttitudeReporter,
    T: TelemetryListener<A::State>,
    G: AnalysisLogFactory<A::State>,
{
    pub fn with_config(mut self, config: FusionConfig) -> Self {
        self.config = config;
        self
    }

    /// Forwards the algorithm state to `listener` every cycle until a send fails.
    pub fn with_telemetry<T2>(self, listener: T2) -> FusionTask<'a, A, R, T2, G>
    where
        T2: TelemetryListener<A::State>,
    {
        FusionTask {
            core: self.core,
            algorithm: self.algorithm,
            reporter: self.reporter,
            config: self.config,
            telemetry: Some(listener),
            analysis: self.analysis,
            measurement: self.measurement,
        }
    }

    pub fn with_analysis_log<G2>(
        self,
        recorder: AnalysisRecorder<'a, A::State, G2>,
    ) -> FusionTask<'a, A, R, T, G2>
    where
        G2: AnalysisLogFactory<A::State>,
    {
        FusionTask {
            core: self.core,
            algorithm: self.algorithm,
            reporter: self.reporter,
            config: self.config,
            telemetry: self.telemetry,
            analysis: Some(recorder),
            measurement: self.measurement,
        }
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// The debug listener is still attached.
    pub fn has_telemetry(&self) -> bool {
        self.telemetry.is_some()
    }

    /// Last measurement fed to the algorithm.
    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    /// Runs one session per IMU driver handed over by the supervisor.
    pub async fn run<I: Imu>(&mut self, handoff: &Handoff<I>) -> ! {
        loop {
            let imu = handoff.receive().await;
            self.run_session(imu).await;
        }
    }

    /// Drives one connected IMU until it fails or is disabled.
    ///
    /// Always closes the driver and clears the connected flag before
    /// returning, so the supervisor picks the sensor up again.
    pub async fn run_session<I: Imu>(&mut self, mut imu: I) -> SessionEnd {
        let core = self.core;
        let mut frame = SensorFrame::from_orientation(core.orientation());
        let mut failures: u8 = 0;
        self.algorithm.reset();

        let mut ticker = Ticker::every(self.config.period);
        let end = loop {
            ticker.next().await;
            if !core.imu.in_use() {
                crate::log_info!("AHRS Info: IMU disabled, closing it");
                break SessionEnd::Disabled;
            }

            if core.cage.take_request() {
                core.cage.set_calibrating(true);
                match imu.calibrate(CALIBRATION_DURATION_S, CALIBRATION_RETRIES).await {
                    Ok(()) => {
                        // Mounting may have been changed while caged.
                        frame = SensorFrame::from_orientation(core.orientation());
                        self.algorithm.reset();
                        crate::log_info!("AHRS Info: IMU recalibrated");
                    }
                    Err(e) => crate::log_warn!("AHRS Error: IMU calibration failed: {}", e),
                }
                core.cage.set_calibrating(false);
            }

            let now = Instant::now();
            let sample = match imu.read().await {
                Ok(s) => s,
                Err(e) => {
                    failures = failures.saturating_add(1);
                    crate::log_warn!(
                        "AHRS Error: IMU read failed ({} in a row): {}",
                        failures,
                        e
                    );
                    if failures > MAX_READ_RETRIES {
                        crate::log_error!(
                            "AHRS Error: IMU read failed {} times, closing it",
                            failures
                        );
                        break SessionEnd::Failed;
                    }
                    continue;
                }
            };
            failures = 0;

            let m = &mut self.measurement;
            m.t = seconds(now);
            m.accel = negate(frame.rotate(sample.accel));
            m.gyro = frame.rotate(sample.gyro);
            m.accel_valid = true;
            match sample.mag {
                Ok(mag) => {
                    m.mag = frame.rotate(mag);
                    m.mag_valid = true;
                }
                Err(e) => {
                    crate::log_debug!("AHRS Error: magnetometer read failed: {}", e);
                    m.mag_valid = false;
                }
            }

            let nav = core.situation.navigation();
            m.wind_valid = nav.track_is_fresh(now, self.config.wind_window);
            if m.wind_valid {
                if let Some(track_time) = nav.last_ground_track {
                    m.tw = seconds(track_time);
                }
                let course = nav.true_course_deg.to_radians();
                m.wind[0] = nav.ground_speed_kts * course.sin();
                m.wind[1] = nav.ground_speed_kts * course.cos();
                m.wind[2] = if core.baro.in_use() {
                    core.situation.baro().vertical_speed_fpm * KNOTS_PER_FPM
                } else {
                    nav.vertical_speed_fps * KNOTS_PER_FPS
                };
            }

            self.algorithm.compute(&self.measurement);

            // The encoder handles an invalid solution itself.
            self.reporter.report(&core.situation);

            if self.algorithm.is_valid() {
                let (roll, pitch, heading) = self.algorithm.roll_pitch_heading();
                let mag_heading = self.algorithm.mag_heading();
                let slip_skid = self.algorithm.slip_skid();
                let turn_rate = self.algorithm.rate_of_turn();
                let g_load = self.algorithm.g_load();
                core.situation.update_attitude(|a| {
                    a.last_attitude = Some(now);
                    a.roll_deg = roll.to_degrees();
                    a.pitch_deg = pitch.to_degrees();
                    a.gyro_heading_deg = heading.to_degrees();
                    a.mag_heading = mag_heading;
                    a.slip_skid = slip_skid;
                    a.turn_rate = turn_rate;
                    a.g_load = g_load;
                });
            } else {
                self.algorithm.reset();
            }

            if let Some(listener) = self.telemetry.as_mut() {
                if let Err(e) = listener.send(self.algorithm.state(), &self.measurement) {
                    crate::log_warn!("AHRS Error: telemetry listener dropped: {}", e);
                    self.telemetry = None;
                }
            }

            if let Some(recorder) = self.analysis.as_mut() {
                let active = recorder.step(
                    core.analysis_log_wanted(),
                    &self.measurement,
                    self.algorithm.state(),
                );
                core.set_logging(active);
            }
        };

        if let Some(recorder) = self.analysis.as_mut() {
            recorder.close();
        }
        core.set_logging(false);
        imu.close().await;
        core.imu.set_connected(false);
        end
    }
}
