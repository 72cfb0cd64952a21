//! Numerically-controlled oscillator and carrier-recovery loop

use num_complex::Complex32;
use std::f32::consts::{PI, TAU};

#[inline]
fn wrap_phase(mut theta: f32) -> f32 {
    while theta > PI {
        theta -= TAU;
    }
    while theta < -PI {
        theta += TAU;
    }
    theta
}

/// Digital phase accumulator producing a complex exponential.
#[derive(Debug, Clone, Default)]
pub struct Nco {
    theta: f32,
    dtheta: f32,
}

impl Nco {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> f32 {
        self.theta
    }

    pub fn frequency(&self) -> f32 {
        self.dtheta
    }

    pub fn set_phase(&mut self, theta: f32) {
        self.theta = wrap_phase(theta);
    }

    pub fn set_frequency(&mut self, dtheta: f32) {
        self.dtheta = dtheta;
    }

    pub fn adjust_phase(&mut self, dphi: f32) {
        self.theta = wrap_phase(self.theta + dphi);
    }

    pub fn adjust_frequency(&mut self, df: f32) {
        self.dtheta += df;
    }

    /// Advance the phase accumulator by one step.
    pub fn step(&mut self) {
        self.theta = wrap_phase(self.theta + self.dtheta);
    }

    /// Mix the input down by the current oscillator phase.
    pub fn mix_down(&self, x: Complex32) -> Complex32 {
        x * Complex32::from_polar(1.0, -self.theta)
    }

    pub fn reset(&mut self) {
        self.theta = 0.0;
        self.dtheta = 0.0;
    }
}

/// Second-order carrier loop driving an [`Nco`] from a phase-error estimate.
///
/// Frequency gain is the loop bandwidth, phase gain its square root; the
/// single-pole filtered error is the loop-filter memory. Resetting the loop
/// filter does not touch the NCO, so an acquired frequency estimate survives
/// the acquisition-to-tracking handover.
#[derive(Debug, Clone)]
pub struct Pll {
    alpha: f32,
    beta: f32,
    err_hat: f32,
}

impl Pll {
    pub fn new(bandwidth: f32) -> Self {
        let mut pll = Self {
            alpha: 0.0,
            beta: 0.0,
            err_hat: 0.0,
        };
        pll.set_bandwidth(bandwidth);
        pll
    }

    pub fn set_bandwidth(&mut self, bandwidth: f32) {
        self.alpha = bandwidth;
        self.beta = bandwidth.sqrt();
    }

    /// Advance the loop by one phase-error observation.
    pub fn step(&mut self, nco: &mut Nco, phase_error: f32) {
        self.err_hat = 0.5 * (self.err_hat + phase_error);
        nco.adjust_frequency(self.alpha * self.err_hat);
        nco.adjust_phase(self.beta * self.err_hat);
    }

    /// Clear the loop-filter memory.
    pub fn reset(&mut self) {
        self.err_hat = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn phase_stays_wrapped() {
        let mut nco = Nco::new();
        nco.set_frequency(1.0);
        for _ in 0..100 {
            nco.step();
        }
        assert!(nco.phase() <= PI && nco.phase() >= -PI);
    }

    #[test]
    fn mix_down_removes_known_rotation() {
        let mut nco = Nco::new();
        nco.set_phase(0.3);
        let x = Complex32::from_polar(1.0, 0.3);
        let z = nco.mix_down(x);
        assert_relative_eq!(z.re, 1.0, epsilon = 1e-6);
        assert_relative_eq!(z.im, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn loop_acquires_static_frequency_offset() {
        // rotate the input at a fixed rate and verify the loop learns it
        let offset = 0.02f32;
        let mut nco = Nco::new();
        let mut pll = Pll::new(1e-3);
        let mut phi = 0.0f32;
        for _ in 0..4000 {
            phi = wrap_phase(phi + offset);
            let x = Complex32::from_polar(1.0, phi);
            let z = nco.mix_down(x);
            pll.step(&mut nco, z.arg());
            nco.step();
        }
        assert_relative_eq!(nco.frequency(), offset, max_relative = 0.05);
    }

    #[test]
    fn reset_clears_filter_but_not_nco() {
        let mut nco = Nco::new();
        let mut pll = Pll::new(1e-2);
        pll.step(&mut nco, 0.5);
        let freq = nco.frequency();
        pll.reset();
        assert_eq!(nco.frequency(), freq);
    }
}
