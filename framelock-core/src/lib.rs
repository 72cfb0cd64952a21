//! Framelock core library
//!
//! A streaming receiver that recovers digitally-modulated framed packets
//! from a complex baseband sample stream corrupted by amplitude drift,
//! carrier offsets, symbol-timing offset, and noise. The heart of the crate
//! is [`FrameSynchronizer`], a pipeline of cooperating DSP blocks driven by
//! a four-state acquisition machine; [`FrameGenerator`] produces matching
//! frames for loopback testing, and [`ellip`] hosts the elliptic
//! filter-design kernel used for analog prototypes.
//!
//! ```
//! use framelock_core::{FrameGenerator, FrameSynchronizer, SyncProperties};
//!
//! let mut recovered = Vec::new();
//! let mut sync = FrameSynchronizer::new(SyncProperties::default(), |report| {
//!     recovered.push(report);
//! })
//! .unwrap();
//!
//! let mut framer = FrameGenerator::new();
//! let samples = framer.generate(&[0u8; 24], &[0u8; 64]);
//! sync.execute(&samples);
//! ```

pub mod channel;
pub mod coding;
pub mod config;
pub mod dsp;
pub mod ellip;
pub mod errors;
pub mod framing;
pub mod logging;
pub mod protocol;
#[cfg(feature = "trace")]
pub mod trace;

pub use config::SyncProperties;
pub use errors::{ConfigError, DomainError, FramelockError};
pub use framing::{AcquisitionState, FrameGenerator, FrameReport, FrameSynchronizer, Regime};
pub use protocol::FrameLayout;
