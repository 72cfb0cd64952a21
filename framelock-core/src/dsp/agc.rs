//! Automatic gain control

use num_complex::Complex32;

const LEVEL_FLOOR: f32 = 1e-12;

/// Single-pole AGC tracking received signal power.
///
/// The level estimate doubles as the RSSI source for the squelch gate; the
/// applied gain is `1/sqrt(level)` clamped to the configured limits.
#[derive(Debug, Clone)]
pub struct Agc {
    bandwidth: f32,
    level: f32,
    gain_min: f32,
    gain_max: f32,
}

impl Agc {
    pub fn new(initial_level: f32, bandwidth: f32) -> Self {
        Self {
            bandwidth,
            level: initial_level.max(LEVEL_FLOOR),
            gain_min: 1e-6,
            gain_max: 1e2,
        }
    }

    pub fn set_bandwidth(&mut self, bandwidth: f32) {
        self.bandwidth = bandwidth;
    }

    pub fn set_gain_limits(&mut self, gain_min: f32, gain_max: f32) {
        self.gain_min = gain_min;
        self.gain_max = gain_max;
    }

    /// Process one sample: update the level estimate, return the scaled sample.
    pub fn execute(&mut self, x: Complex32) -> Complex32 {
        self.level = (1.0 - self.bandwidth) * self.level + self.bandwidth * x.norm_sqr();
        x * self.gain()
    }

    fn gain(&self) -> f32 {
        (1.0 / self.level.max(LEVEL_FLOOR).sqrt()).clamp(self.gain_min, self.gain_max)
    }

    /// Instantaneous smoothed signal power estimate.
    pub fn signal_level(&self) -> f32 {
        self.level
    }

    /// Signal level in dB.
    pub fn rssi_db(&self) -> f32 {
        10.0 * self.level.max(LEVEL_FLOOR).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_toward_unit_output_power() {
        let mut agc = Agc::new(1.0, 0.05);
        let x = Complex32::new(0.1, 0.0);
        let mut y = Complex32::new(0.0, 0.0);
        for _ in 0..2000 {
            y = agc.execute(x);
        }
        assert!((y.norm() - 1.0).abs() < 0.05, "output norm {}", y.norm());
        assert!((agc.signal_level() - 0.01).abs() < 1e-3);
    }

    #[test]
    fn rssi_tracks_level_in_db() {
        let mut agc = Agc::new(1.0, 0.1);
        for _ in 0..500 {
            agc.execute(Complex32::new(0.0, 0.0));
        }
        // silence drives the estimate far below any practical squelch floor
        assert!(agc.rssi_db() < -15.0);
    }

    #[test]
    fn gain_respects_limits() {
        let mut agc = Agc::new(1e-10, 0.1);
        let y = agc.execute(Complex32::new(1e-6, 0.0));
        assert!(y.norm() <= 1e-6 * 1e2 + f32::EPSILON);
    }
}
