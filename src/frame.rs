//! Sensor-to-body frame rotation.
//!
//! Body axes are forward (x), left wing (y), up (z). The rotation is built
//! from the two mounting selectors: row 0 picks the sensor axis pointing
//! forward, row 2 the one pointing up, and row 1 is `up × forward` so the
//! result is right-handed.

use crate::config::OrientationConfig;
use crate::error::FrameError;
use micromath::F32Ext;

/// 3×3 rotation from sensor-native axes to body axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    pub m: [[f32; 3]; 3],
}

/// Signed unit basis vector for a selector in ±1..±3.
fn basis(selector: i8) -> [f32; 3] {
    let mut v = [0.0; 3];
    let idx = selector.unsigned_abs() as usize;
    if (1..=3).contains(&idx) {
        v[idx - 1] = if selector < 0 { -1.0 } else { 1.0 };
    }
    v
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

impl SensorFrame {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Builds the rotation for `cfg`.
    ///
    /// The caller guarantees the selectors name different axes
    /// (`OrientationConfig::validate`); otherwise the matrix is degenerate.
    pub fn from_orientation(cfg: OrientationConfig) -> Self {
        let forward = basis(cfg.forward);
        let up = basis(cfg.up);
        Self {
            m: [forward, cross(up, forward), up],
        }
    }

    /// `R · v`
    pub fn rotate(&self, v: [f32; 3]) -> [f32; 3] {
        let m = &self.m;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }
}

impl Default for SensorFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Signed selector of the axis carrying the largest acceleration.
///
/// Used during orientation setup: with the airframe level, the axis reading
/// the most gravity is the vertical one.
pub fn dominant_axis(accel: [f32; 3]) -> Result<i8, FrameError> {
    let mag = accel.map(F32Ext::abs);
    for i in 0..3 {
        let (j, k) = ((i + 1) % 3, (i + 2) % 3);
        if mag[i] > mag[j] && mag[i] > mag[k] {
            let sel = (i + 1) as i8;
            return Ok(if accel[i] > 0.0 { sel } else { -sel });
        }
    }
    Err(FrameError::Ambiguous)
}
