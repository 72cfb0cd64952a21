//! BPSK/QPSK modulation and soft demodulation

use num_complex::Complex32;
use std::f32::consts::FRAC_1_SQRT_2;

/// Constellation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationScheme {
    Bpsk,
    Qpsk,
}

impl ModulationScheme {
    pub fn bits_per_symbol(self) -> u32 {
        match self {
            ModulationScheme::Bpsk => 1,
            ModulationScheme::Qpsk => 2,
        }
    }

    pub fn constellation_size(self) -> u8 {
        1 << self.bits_per_symbol()
    }

    /// Reference constellation point for a symbol index.
    pub fn point(self, symbol: u8) -> Complex32 {
        match self {
            ModulationScheme::Bpsk => {
                if symbol & 1 == 0 {
                    Complex32::new(1.0, 0.0)
                } else {
                    Complex32::new(-1.0, 0.0)
                }
            }
            ModulationScheme::Qpsk => {
                // Gray-coded sign-quadrant mapping: bit 1 selects I, bit 0 selects Q
                let re = if symbol & 0x02 == 0 {
                    FRAC_1_SQRT_2
                } else {
                    -FRAC_1_SQRT_2
                };
                let im = if symbol & 0x01 == 0 {
                    FRAC_1_SQRT_2
                } else {
                    -FRAC_1_SQRT_2
                };
                Complex32::new(re, im)
            }
        }
    }
}

/// Symbol-index to constellation-point mapper.
#[derive(Debug, Clone)]
pub struct Modulator {
    scheme: ModulationScheme,
}

impl Modulator {
    pub fn new(scheme: ModulationScheme) -> Self {
        Self { scheme }
    }

    pub fn modulate(&self, symbol: u8) -> Complex32 {
        debug_assert!(symbol < self.scheme.constellation_size());
        self.scheme.point(symbol)
    }
}

/// Hard-decision demodulator that records the phase error of the last
/// decision for the carrier loop.
#[derive(Debug, Clone)]
pub struct Demodulator {
    scheme: ModulationScheme,
    phase_error: f32,
}

impl Demodulator {
    pub fn new(scheme: ModulationScheme) -> Self {
        Self {
            scheme,
            phase_error: 0.0,
        }
    }

    pub fn scheme(&self) -> ModulationScheme {
        self.scheme
    }

    /// Decide the nearest constellation point and return its symbol index.
    pub fn demodulate(&mut self, z: Complex32) -> u8 {
        let symbol = match self.scheme {
            ModulationScheme::Bpsk => u8::from(z.re < 0.0),
            ModulationScheme::Qpsk => (u8::from(z.re < 0.0) << 1) | u8::from(z.im < 0.0),
        };
        let reference = self.scheme.point(symbol);
        self.phase_error = (z * reference.conj()).arg();
        symbol
    }

    /// Phase error of the most recent decision, in radians.
    pub fn phase_error(&self) -> f32 {
        self.phase_error
    }
}
