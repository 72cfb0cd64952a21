//! Channel modeling and impairment simulation
//!
//! Helpers to corrupt a baseband sample stream with the impairments the
//! synchronizer is expected to remove: AWGN, static gain, and carrier
//! frequency/phase offset.

use num_complex::Complex32;
use rand::Rng;
use rand_distr::StandardNormal;

/// Add complex AWGN with per-component standard deviation `noise_std`.
pub fn apply_awgn<R: Rng>(samples: &[Complex32], noise_std: f32, rng: &mut R) -> Vec<Complex32> {
    samples
        .iter()
        .map(|&x| {
            let ni: f32 = rng.sample::<f32, _>(StandardNormal) * noise_std;
            let nq: f32 = rng.sample::<f32, _>(StandardNormal) * noise_std;
            x + Complex32::new(ni, nq)
        })
        .collect()
}

/// Rotate the stream by a carrier offset of `dphi` radians per sample,
/// starting from `phase0`.
pub fn apply_carrier_offset(samples: &[Complex32], dphi: f32, phase0: f32) -> Vec<Complex32> {
    samples
        .iter()
        .enumerate()
        .map(|(n, &x)| x * Complex32::from_polar(1.0, phase0 + dphi * n as f32))
        .collect()
}

/// Apply gain, carrier offset, and AWGN in one pass.
pub fn apply_channel<R: Rng>(
    samples: &[Complex32],
    gain: f32,
    dphi: f32,
    noise_std: f32,
    rng: &mut R,
) -> Vec<Complex32> {
    samples
        .iter()
        .enumerate()
        .map(|(n, &x)| {
            let rotated = x * gain * Complex32::from_polar(1.0, dphi * n as f32);
            let ni: f32 = rng.sample::<f32, _>(StandardNormal) * noise_std;
            let nq: f32 = rng.sample::<f32, _>(StandardNormal) * noise_std;
            rotated + Complex32::new(ni, nq)
        })
        .collect()
}

/// Per-component noise standard deviation for a target Es/N0 in dB, given
/// the average sample energy of the signal.
pub fn noise_std_for_es_n0(es_n0_db: f32, sample_energy: f32, samples_per_symbol: usize) -> f32 {
    let es = sample_energy * samples_per_symbol as f32;
    let n0 = es / 10f32.powf(es_n0_db / 10.0);
    (n0 / 2.0).sqrt()
}
