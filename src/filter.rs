use embassy_time::Duration;
use micromath::F32Ext;

/// Time constant of the climb-rate smoothing, slightly quicker than a typical VSI.
pub const VSI_TIME_CONSTANT_S: f32 = 5.0;

/// Pressure altitude (ft) from static pressure (hPa), standard atmosphere.
pub fn pressure_altitude_ft(pressure_hpa: f32) -> f32 {
    145_366.45 * (1.0 - (pressure_hpa / 1013.25).powf(0.190_284))
}

/// Climb rate from successive altitudes, smoothed by a single-pole EWMA.
///
/// Assumes the samples arrive at the fixed period given at construction; the
/// filter does not adapt to jitter.
pub struct VerticalSpeed {
    /// Weight on the previous rate
    u: f32,
    dt_min: f32,
    last_alt: Option<f32>,
    rate: f32,
}

impl VerticalSpeed {
    pub fn new(period: Duration) -> Self {
        let dt_s = period.as_micros() as f32 / 1_000_000.0;
        Self {
            u: VSI_TIME_CONSTANT_S / (VSI_TIME_CONSTANT_S + dt_s),
            dt_min: dt_s / 60.0,
            last_alt: None,
            rate: 0.0,
        }
    }

    /// Feeds one altitude (ft) and returns the smoothed rate (ft/min).
    ///
    /// The first sample only seeds the previous altitude.
    pub fn update(&mut self, altitude_ft: f32) -> f32 {
        let last = self.last_alt.unwrap_or(altitude_ft);
        self.rate = self.u * self.rate + (1.0 - self.u) * (altitude_ft - last) / self.dt_min;
        self.last_alt = Some(altitude_ft);
        self.rate
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn reset(&mut self) {
        self.last_alt = None;
        self.rate = 0.0;
    }
}
