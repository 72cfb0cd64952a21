//! Maximal-length sequence generation and preamble correlation

use num_complex::Complex32;

/// Degree-6 maximal-length LFSR (x⁶ + x + 1), 63-chip period.
#[derive(Debug, Clone)]
pub struct MSequence {
    state: u8,
}

impl MSequence {
    pub fn new() -> Self {
        Self { state: 0b00_0001 }
    }

    /// Advance the register one step and return the output chip.
    pub fn advance(&mut self) -> u8 {
        let out = self.state & 1;
        let feedback = (self.state ^ (self.state >> 1)) & 1;
        self.state = (self.state >> 1) | (feedback << 5);
        out
    }
}

impl Default for MSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// First `len` chips of the PN sequence mapped `{0,1} → {−1,+1}`.
pub fn pn_preamble(len: usize) -> Vec<f32> {
    let mut ms = MSequence::new();
    (0..len)
        .map(|_| if ms.advance() == 1 { 1.0 } else { -1.0 })
        .collect()
}

/// Sliding normalized correlator against a fixed binary pattern.
///
/// Consumes the real part of each mixed-down symbol; output is the
/// normalized cross-correlation in [−1, 1].
#[derive(Debug, Clone)]
pub struct BinarySync {
    pattern: Vec<f32>,
    window: Vec<f32>,
    head: usize,
}

impl BinarySync {
    pub fn new(pattern: Vec<f32>) -> Self {
        let n = pattern.len();
        Self {
            pattern,
            window: vec![0.0; n],
            head: 0,
        }
    }

    /// Push one symbol and return the correlation over the current window.
    pub fn correlate(&mut self, z: Complex32) -> f32 {
        let n = self.window.len();
        self.window[self.head] = z.re;
        self.head = (self.head + 1) % n;

        let mut dot = 0.0f32;
        let mut energy = 0.0f32;
        for (i, &p) in self.pattern.iter().enumerate() {
            // oldest window entry aligns with the first pattern chip
            let w = self.window[(self.head + i) % n];
            dot += w * p;
            energy += w * w;
        }
        let norm = (energy * self.pattern.len() as f32).sqrt();
        if norm < 1e-9 {
            0.0
        } else {
            dot / norm
        }
    }

    pub fn clear(&mut self) {
        self.window.fill(0.0);
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msequence_has_maximal_period() {
        let mut ms = MSequence::new();
        let first: Vec<u8> = (0..63).map(|_| ms.advance()).collect();
        let second: Vec<u8> = (0..63).map(|_| ms.advance()).collect();
        assert_eq!(first, second);
        // balanced: 32 ones, 31 zeros over one period
        assert_eq!(first.iter().filter(|&&b| b == 1).count(), 32);
    }

    #[test]
    fn preamble_is_bipolar() {
        let pn = pn_preamble(64);
        assert_eq!(pn.len(), 64);
        assert!(pn.iter().all(|&c| c == 1.0 || c == -1.0));
    }

    #[test]
    fn correlator_peaks_on_pattern() {
        let pn = pn_preamble(64);
        let mut sync = BinarySync::new(pn.clone());
        let mut peak = 0.0f32;
        for &c in &pn {
            peak = sync.correlate(Complex32::new(c, 0.0)).max(peak);
        }
        assert!(peak > 0.999, "peak {}", peak);
    }

    #[test]
    fn correlator_sees_negated_pattern() {
        let pn = pn_preamble(64);
        let mut sync = BinarySync::new(pn.clone());
        let mut last = 0.0;
        for &c in &pn {
            last = sync.correlate(Complex32::new(-c, 0.0));
        }
        assert!(last < -0.999, "correlation {}", last);
    }

    #[test]
    fn correlator_quiet_on_silence() {
        let pn = pn_preamble(64);
        let mut sync = BinarySync::new(pn);
        let mut out = 0.0;
        for _ in 0..128 {
            out = sync.correlate(Complex32::new(0.0, 0.0));
        }
        assert_eq!(out, 0.0);
    }
}
