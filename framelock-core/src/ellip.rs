//! Elliptic filter-design kernel
//!
//! Pure single-precision routines for the analog prototype design: the
//! Landen transformation, the complete elliptic integrals K(k) and K'(k),
//! the elliptic degree equation, and the Jacobi cd() function. All are
//! iterative with a caller-chosen recursion depth; they fail only on domain
//! violations.

use std::f32::consts::PI;

use crate::errors::DomainError;

fn check_modulus(k: f32) -> Result<(), DomainError> {
    if !k.is_finite() || k.abs() >= 1.0 {
        return Err(DomainError::InvalidModulus { k });
    }
    Ok(())
}

/// One iteration of the descending Landen transformation.
///
/// `λ(k) = (1 − √(1 − k²)) / (1 + √(1 − k²))`, defined for `0 ≤ k < 1`.
pub fn landen(k: f32) -> Result<f32, DomainError> {
    check_modulus(k)?;
    let kp = (1.0 - k * k).sqrt();
    Ok((1.0 - kp) / (1.0 + kp))
}

// Unchecked variant for internal iteration, where the modulus shrinks on
// every step and stays inside the domain.
#[inline]
fn landen_step(k: f32) -> f32 {
    let kp = (1.0 - k * k).sqrt();
    (1.0 - kp) / (1.0 + kp)
}

/// Complete elliptic integrals `(K(k), K'(k))` using `n` Landen iterations.
pub fn ellipk(k: f32, n: u32) -> Result<(f32, f32), DomainError> {
    check_modulus(k)?;
    let mut kn = k;
    let mut knp = (1.0 - k * k).sqrt();
    let mut big_k = 0.5 * PI;
    let mut big_kp = 0.5 * PI;
    for _ in 0..n {
        kn = landen_step(kn);
        knp = landen_step(knp);
        big_k *= 1.0 + kn;
        big_kp *= 1.0 + knp;
    }
    Ok((big_k, big_kp))
}

/// Elliptic degree equation: solve for the modulus `k` given the
/// selectivity `n_sel` and secondary modulus `k1`.
pub fn ellipdeg(n_sel: f32, k1: f32, n: u32) -> Result<f32, DomainError> {
    if !n_sel.is_finite() || n_sel <= 0.0 {
        return Err(DomainError::InvalidSelectivity { n: n_sel });
    }
    let (big_k1, big_k1p) = ellipk(k1, n)?;

    // nome of k1, then the degree-scaled nome
    let q1 = (-PI * big_k1p / big_k1).exp();
    let q = q1.powf(1.0 / n_sel);

    let mut b = 0.0f32;
    for m in 0..n {
        b += q.powf((m * (m + 1)) as f32);
    }
    let mut a = 0.0f32;
    for m in 1..n {
        a += q.powf((m * m) as f32);
    }

    let g = b / (1.0 + 2.0 * a);
    Ok(4.0 * q.sqrt() * g * g)
}

/// Jacobi `cd(u, k)` elliptic function via `n` ascending Landen steps.
///
/// `u` is normalized so that `cd(0, k) = 1` and `cd(1, k) = 0`.
pub fn cd(u: f32, k: f32, n: u32) -> Result<f32, DomainError> {
    check_modulus(k)?;
    let mut w = (u * PI * 0.5).cos();
    let mut w_inv = 1.0 / w;
    for i in (1..=n).rev() {
        // modulus after i descending Landen steps, recomputed from scratch
        let mut ki = k;
        for _ in 0..i {
            ki = landen_step(ki);
        }
        w = 1.0 / w_inv;
        w_inv = (w_inv + ki * w) / (1.0 + ki);
    }
    Ok(1.0 / w_inv)
}
