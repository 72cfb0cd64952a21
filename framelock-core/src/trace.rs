//! Debug trace rings
//!
//! Fixed-capacity rings of per-sample signals for offline inspection. The
//! rings are single-producer, lock-free by construction, and exist only when
//! the `trace` feature is enabled; every push site compiles away otherwise.
//! When a dump path is configured the owning synchronizer writes the rings
//! out as an Octave plotting script on drop.

use std::io::{self, Write};
use std::path::PathBuf;

use num_complex::Complex32;

pub const TRACE_CAPACITY: usize = 4096;

/// Overwriting ring buffer of the last `capacity` values.
#[derive(Debug, Clone)]
pub struct TraceRing<T: Copy + Default> {
    buf: Vec<T>,
    head: usize,
    filled: bool,
}

impl<T: Copy + Default> TraceRing<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![T::default(); capacity],
            head: 0,
            filled: false,
        }
    }

    pub fn push(&mut self, value: T) {
        self.buf[self.head] = value;
        self.head += 1;
        if self.head == self.buf.len() {
            self.head = 0;
            self.filled = true;
        }
    }

    /// Values in arrival order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newest, oldest) = self.buf.split_at(self.head);
        let skip = if self.filled { 0 } else { oldest.len() };
        oldest.iter().chain(newest.iter()).skip(skip)
    }

    pub fn len(&self) -> usize {
        if self.filled {
            self.buf.len()
        } else {
            self.head
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The seven per-sample diagnostic rings of the synchronizer.
#[derive(Debug, Clone)]
pub struct TraceBuffers {
    pub(crate) input: TraceRing<Complex32>,
    pub(crate) level: TraceRing<f32>,
    pub(crate) agc_out: TraceRing<Complex32>,
    pub(crate) rxy: TraceRing<f32>,
    pub(crate) nco_out: TraceRing<Complex32>,
    pub(crate) nco_phase: TraceRing<f32>,
    pub(crate) nco_freq: TraceRing<f32>,
    pub(crate) dump_path: Option<PathBuf>,
}

impl TraceBuffers {
    pub fn new() -> Self {
        Self {
            input: TraceRing::new(TRACE_CAPACITY),
            level: TraceRing::new(TRACE_CAPACITY),
            agc_out: TraceRing::new(TRACE_CAPACITY),
            rxy: TraceRing::new(TRACE_CAPACITY),
            nco_out: TraceRing::new(TRACE_CAPACITY),
            nco_phase: TraceRing::new(TRACE_CAPACITY),
            nco_freq: TraceRing::new(TRACE_CAPACITY),
            dump_path: None,
        }
    }

    /// Write the rings as an Octave script for offline plotting.
    pub fn write_script<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "% framelock trace dump: auto-generated file")?;
        writeln!(w, "clear all;\nclose all;\n")?;

        write_real(w, "rssi", self.level.iter().map(|&v| 10.0 * v.max(1e-12).log10()))?;
        writeln!(w, "figure; plot(rssi); ylabel('RSSI [dB]');\n")?;

        write_complex(w, "x", self.input.iter())?;
        writeln!(w, "figure; plot(real(x)); hold on; plot(imag(x)); ylabel('input');\n")?;

        write_complex(w, "agc_out", self.agc_out.iter())?;
        writeln!(w, "figure; plot(real(agc_out)); hold on; plot(imag(agc_out)); ylabel('agc out');\n")?;

        write_real(w, "rxy", self.rxy.iter().copied())?;
        writeln!(w, "figure; plot(rxy); ylabel('|r_{{xy}}|');\n")?;

        write_complex(w, "nco_out", self.nco_out.iter())?;
        writeln!(w, "figure; plot(nco_out, 'x'); axis square; ylabel('constellation');\n")?;

        write_real(w, "nco_phase", self.nco_phase.iter().copied())?;
        writeln!(w, "figure; plot(nco_phase); ylabel('nco phase [rad]');\n")?;

        write_real(w, "nco_freq", self.nco_freq.iter().copied())?;
        writeln!(w, "figure; plot(nco_freq); ylabel('nco freq [rad/symbol]');")?;
        Ok(())
    }

    pub fn set_dump_path(&mut self, path: Option<PathBuf>) {
        self.dump_path = path;
    }

    pub fn dump_path(&self) -> Option<&PathBuf> {
        self.dump_path.as_ref()
    }
}

impl Default for TraceBuffers {
    fn default() -> Self {
        Self::new()
    }
}

fn write_real<W: Write>(
    w: &mut W,
    name: &str,
    values: impl Iterator<Item = f32>,
) -> io::Result<()> {
    write!(w, "{} = [", name)?;
    for v in values {
        write!(w, " {:12.4e}", v)?;
    }
    writeln!(w, " ];")
}

fn write_complex<'a, W: Write>(
    w: &mut W,
    name: &str,
    values: impl Iterator<Item = &'a Complex32>,
) -> io::Result<()> {
    write!(w, "{} = [", name)?;
    for v in values {
        write!(w, " {:12.4e}+j*{:12.4e}", v.re, v.im)?;
    }
    writeln!(w, " ];")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_overwrites_oldest() {
        let mut ring = TraceRing::new(4);
        for i in 0..6 {
            ring.push(i as f32);
        }
        let values: Vec<f32> = ring.iter().copied().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn ring_iterates_partial_fill_in_order() {
        let mut ring = TraceRing::new(8);
        ring.push(1.0f32);
        ring.push(2.0);
        let values: Vec<f32> = ring.iter().copied().collect();
        assert_eq!(values, vec![1.0, 2.0]);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn script_dump_mentions_every_signal() {
        let mut buffers = TraceBuffers::new();
        buffers.input.push(Complex32::new(1.0, -1.0));
        buffers.level.push(0.5);
        buffers.rxy.push(0.9);
        let mut script = Vec::new();
        buffers.write_script(&mut script).unwrap();
        let text = String::from_utf8(script).unwrap();
        for name in ["rssi", "agc_out", "rxy", "nco_out", "nco_phase", "nco_freq"] {
            assert!(text.contains(name), "missing {}", name);
        }
    }
}
