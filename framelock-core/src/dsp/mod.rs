//! DSP primitives owned by the frame synchronizer
//!
//! Each primitive exposes a small capability surface (step/execute plus the
//! knobs the synchronizer actually turns) and is owned by value.

pub mod agc;
pub mod bsync;
pub mod modem;
pub mod nco;
pub mod symsync;

pub use agc::Agc;
pub use bsync::{pn_preamble, BinarySync, MSequence};
pub use modem::{Demodulator, Modulator, ModulationScheme};
pub use nco::{Nco, Pll};
pub use symsync::{design_rrc, Interpolator, SymSync};
