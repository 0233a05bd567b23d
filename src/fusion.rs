//! Interface to the attitude/heading estimator.

/// One estimator input, in body axes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurement {
    /// Sample time, seconds on the monotonic clock
    pub t: f64,
    /// Time of the ground-track fix the wind terms came from
    pub tw: f64,
    /// Specific force, sign-inverted relative to gyro and mag
    pub accel: [f32; 3],
    /// Angular rate
    pub gyro: [f32; 3],
    /// Magnetic field
    pub mag: [f32; 3],
    /// Ground velocity east/north and vertical speed, knots
    pub wind: [f32; 3],
    /// Accelerometer and gyro usable
    pub accel_valid: bool,
    pub mag_valid: bool,
    pub wind_valid: bool,
}

impl Measurement {
    pub const fn new() -> Self {
        Self {
            t: 0.0,
            tw: 0.0,
            accel: [0.0; 3],
            gyro: [0.0; 3],
            mag: [0.0; 3],
            wind: [0.0; 3],
            accel_valid: false,
            mag_valid: false,
            wind_valid: false,
        }
    }
}

/// Attitude/heading estimator (Kalman, complementary, ...).
///
/// Needs inputs faster than 10 Hz.
pub trait FusionAlgorithm {
    /// Internal state exported to telemetry and analysis logs.
    type State;

    /// Discards internal state so the next valid solution starts clean.
    fn reset(&mut self);

    fn compute(&mut self, m: &Measurement);

    fn is_valid(&self) -> bool;

    /// Roll, pitch, heading in radians.
    fn roll_pitch_heading(&self) -> (f32, f32, f32);

    fn mag_heading(&self) -> f32;

    fn slip_skid(&self) -> f32;

    fn rate_of_turn(&self) -> f32;

    fn g_load(&self) -> f32;

    fn state(&self) -> &Self::State;
}
