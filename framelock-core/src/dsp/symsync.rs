//! Matched-filter pulse shaping and polyphase symbol-timing recovery

use num_complex::Complex32;

/// Design a root-raised-cosine filter with `k` samples per symbol, a span of
/// `m` symbols on each side of center, and rolloff `beta`.
///
/// Returns `2*k*m + 1` taps normalized to unit energy. Coefficients are
/// computed in f64 and narrowed to f32.
pub fn design_rrc(k: usize, m: usize, beta: f32) -> Vec<f32> {
    assert!(k >= 1 && m >= 1, "invalid filter dimensions");
    assert!(beta > 0.0 && beta < 1.0, "rolloff outside (0, 1)");

    let beta = beta as f64;
    let len = 2 * k * m + 1;
    let mut h = vec![0.0f64; len];

    for (i, tap) in h.iter_mut().enumerate() {
        // tap instant in symbol periods, centered
        let t = (i as f64 - (k * m) as f64) / k as f64;
        let four_beta_t = 4.0 * beta * t;

        *tap = if t.abs() < 1e-9 {
            1.0 - beta + 4.0 * beta / std::f64::consts::PI
        } else if (four_beta_t.abs() - 1.0).abs() < 1e-6 {
            // t = ±1/(4β) singularity
            let x = std::f64::consts::PI / (4.0 * beta);
            (beta / std::f64::consts::SQRT_2)
                * ((1.0 + 2.0 / std::f64::consts::PI) * x.sin()
                    + (1.0 - 2.0 / std::f64::consts::PI) * x.cos())
        } else {
            let pi_t = std::f64::consts::PI * t;
            let num = (pi_t * (1.0 - beta)).sin() + four_beta_t * (pi_t * (1.0 + beta)).cos();
            let den = pi_t * (1.0 - four_beta_t * four_beta_t);
            num / den
        };
    }

    let energy: f64 = h.iter().map(|&x| x * x).sum();
    let scale = 1.0 / energy.sqrt();
    h.iter().map(|&x| (x * scale) as f32).collect()
}

/// Transmit-side pulse-shaping interpolator: one symbol in, `k` samples out.
#[derive(Debug, Clone)]
pub struct Interpolator {
    k: usize,
    taps: Vec<f32>,
    window: Vec<Complex32>,
}

impl Interpolator {
    pub fn new(k: usize, m: usize, beta: f32) -> Self {
        let taps = design_rrc(k, m, beta);
        let symbol_span = 2 * m + 1;
        Self {
            k,
            taps,
            window: vec![Complex32::default(); symbol_span],
        }
    }

    /// Symbols of delay introduced by the shaping filter.
    pub fn delay(&self) -> usize {
        (self.window.len() - 1) / 2
    }

    /// Shape one symbol into `k` output samples.
    pub fn execute(&mut self, symbol: Complex32, out: &mut Vec<Complex32>) {
        let window_len = self.window.len();
        self.window.copy_within(0..window_len - 1, 1);
        self.window[0] = symbol;
        for phase in 0..self.k {
            let mut acc = Complex32::default();
            for (j, &w) in self.window.iter().enumerate() {
                let idx = j * self.k + phase;
                if idx < self.taps.len() {
                    acc += w * self.taps[idx];
                }
            }
            out.push(acc);
        }
    }

    /// Push zero symbols through to drain the filter memory.
    pub fn flush(&mut self, out: &mut Vec<Complex32>) {
        for _ in 0..2 * self.delay() {
            self.execute(Complex32::default(), out);
        }
        self.window.fill(Complex32::default());
    }
}

/// Polyphase matched-filter symbol synchronizer.
///
/// The prototype filter is designed at `k * npfb` samples per symbol and
/// decomposed into `npfb` subfilters of `2*k*m + 1` taps; a derivative bank
/// feeds the matched-times-derivative timing error detector. The timing
/// phase advances `rate` input samples per output symbol, with `rate`
/// steered around `k` by the loop filter.
#[derive(Debug, Clone)]
pub struct SymSync {
    k: f32,
    npfb: usize,
    mf: Vec<Vec<f32>>,
    dmf: Vec<Vec<f32>>,
    window: Vec<Complex32>,
    timer: f32,
    rate: f32,
    err_hat: f32,
    bandwidth: f32,
}

impl SymSync {
    pub fn new(k: usize, npfb: usize, m: usize, beta: f32) -> Self {
        let proto = design_rrc(k * npfb, m, beta);
        let taps_per_phase = 2 * k * m + 1;

        // normalize so the phase-0 subfilter has unit energy
        let e0: f32 = (0..taps_per_phase)
            .filter_map(|j| proto.get(j * npfb))
            .map(|&x| x * x)
            .sum();
        let scale = 1.0 / e0.sqrt();

        let mut mf = Vec::with_capacity(npfb);
        let mut dmf = Vec::with_capacity(npfb);
        for p in 0..npfb {
            let mut sub = vec![0.0f32; taps_per_phase];
            let mut dsub = vec![0.0f32; taps_per_phase];
            for j in 0..taps_per_phase {
                let i = p + j * npfb;
                sub[j] = proto.get(i).copied().unwrap_or(0.0) * scale;
                let hi = proto.get(i + 1).copied().unwrap_or(0.0);
                let lo = if i == 0 {
                    0.0
                } else {
                    proto.get(i - 1).copied().unwrap_or(0.0)
                };
                // derivative along the fine-time axis, rescaled to per-sample
                dsub[j] = 0.5 * (hi - lo) * npfb as f32 * scale;
            }
            mf.push(sub);
            dmf.push(dsub);
        }

        Self {
            k: k as f32,
            npfb,
            mf,
            dmf,
            window: vec![Complex32::default(); taps_per_phase],
            // start between filterbank phases; the loop settles the rest
            timer: k as f32 - 0.5,
            rate: k as f32,
            err_hat: 0.0,
            bandwidth: 0.0,
        }
    }

    pub fn set_loop_bandwidth(&mut self, bandwidth: f32) {
        self.bandwidth = bandwidth;
    }

    /// Zero the filter state and recenter the timing loop.
    pub fn clear(&mut self) {
        self.window.fill(Complex32::default());
        self.timer = self.k - 0.5;
        self.rate = self.k;
        self.err_hat = 0.0;
    }

    #[inline]
    fn filter(&self, taps: &[f32]) -> Complex32 {
        let mut acc = Complex32::default();
        for (w, &h) in self.window.iter().zip(taps) {
            acc += w * h;
        }
        acc
    }

    /// Consume one input sample, appending 0 or more output symbols.
    pub fn execute(&mut self, x: Complex32, out: &mut Vec<Complex32>) {
        let window_len = self.window.len();
        self.window.copy_within(0..window_len - 1, 1);
        self.window[0] = x;

        self.timer -= 1.0;
        while self.timer < 1.0 {
            let frac = self.timer.max(0.0);
            let phase = ((frac * self.npfb as f32) as usize).min(self.npfb - 1);
            let y = self.filter(&self.mf[phase]);
            let dy = self.filter(&self.dmf[phase]);

            // matched x derivative product: positive when sampling early
            let err = (y.re * dy.re + y.im * dy.im).clamp(-1.0, 1.0);
            self.err_hat = 0.5 * (self.err_hat + err);
            let max_step = self.k / 16.0;
            self.rate = (self.k + self.k * self.bandwidth.sqrt() * self.err_hat)
                .clamp(self.k - max_step, self.k + max_step);

            self.timer += self.rate;
            out.push(y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rrc_taps_have_unit_energy() {
        let h = design_rrc(2, 3, 0.7);
        assert_eq!(h.len(), 13);
        let energy: f32 = h.iter().map(|&x| x * x).sum();
        assert_relative_eq!(energy, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn rrc_is_symmetric_and_peaks_at_center() {
        let h = design_rrc(2, 3, 0.7);
        let center = h.len() / 2;
        for i in 0..h.len() {
            assert_relative_eq!(h[i], h[h.len() - 1 - i], epsilon = 1e-6);
        }
        for (i, &tap) in h.iter().enumerate() {
            if i != center {
                assert!(tap.abs() < h[center]);
            }
        }
    }

    #[test]
    fn matched_pair_has_near_unit_peak() {
        // shape an isolated unit symbol, run it back through the
        // synchronizer's phase-0 subfilter, and look at the peak
        let mut interp = Interpolator::new(2, 3, 0.7);
        let sync = SymSync::new(2, 32, 3, 0.7);

        let mut shaped = Vec::new();
        interp.execute(Complex32::new(1.0, 0.0), &mut shaped);
        interp.flush(&mut shaped);

        let taps = &sync.mf[0];
        let mut peak = 0.0f32;
        for start in 0..shaped.len() {
            let mut acc = 0.0f32;
            for (j, &h) in taps.iter().enumerate() {
                if start >= j {
                    acc += shaped[start - j].re * h;
                }
            }
            peak = peak.max(acc);
        }
        assert!((peak - 1.0).abs() < 0.05, "matched peak {}", peak);
    }

    #[test]
    fn recovers_symbols_from_clean_shaped_stream() {
        let symbols: Vec<Complex32> = (0..64)
            .map(|i| Complex32::new(if (i * 7) % 3 == 0 { 1.0 } else { -1.0 }, 0.0))
            .collect();

        let mut interp = Interpolator::new(2, 3, 0.7);
        let mut samples = Vec::new();
        for &s in &symbols {
            interp.execute(s, &mut samples);
        }
        interp.flush(&mut samples);

        let mut sync = SymSync::new(2, 32, 3, 0.7);
        sync.set_loop_bandwidth(0.01);
        let mut recovered = Vec::new();
        for &x in &samples {
            sync.execute(x, &mut recovered);
        }

        // skip the joint filter transient, then compare signs; the net
        // delay depends on which matched-filter peak the loop settles to
        assert!(recovered.len() >= symbols.len());
        let usable = symbols.len() - 8;
        let mut best_ratio = 0.0f32;
        for delay in 4..=8 {
            let mut matches = 0;
            for i in 8..usable {
                let rx = recovered[i + delay];
                if (rx.re > 0.0) == (symbols[i].re > 0.0) {
                    matches += 1;
                }
            }
            best_ratio = best_ratio.max(matches as f32 / (usable - 8) as f32);
        }
        assert!(best_ratio > 0.95, "symbol sign match ratio {}", best_ratio);
    }
}
