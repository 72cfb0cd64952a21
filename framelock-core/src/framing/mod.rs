//! Frame generation and synchronization

pub mod framer;
pub mod synchronizer;

pub use framer::FrameGenerator;
pub use synchronizer::{AcquisitionState, FrameReport, FrameSynchronizer, Regime};
