//! Streaming frame synchronizer
//!
//! Recovers framed packets from a continuous complex baseband stream. Each
//! input sample runs through AGC, the squelch gate, matched-filter symbol
//! timing recovery, NCO mixdown, and demodulation; recovered symbols drive a
//! four-state acquisition machine that correlates for the PN preamble,
//! collects header and payload symbols, decodes them, and hands each
//! completed frame to the user callback.

use num_complex::Complex32;
use std::f32::consts::PI;
use std::fmt;
use std::mem;

use crate::coding::{self, BlockInterleaver};
use crate::config::SyncProperties;
use crate::dsp::{
    pn_preamble, Agc, BinarySync, Demodulator, ModulationScheme, Nco, Pll, SymSync,
};
use crate::errors::ConfigError;
use crate::logging::EventLog;
use crate::protocol::{pack_symbols, FrameLayout, MatchedFilter, PN_DETECT_THRESHOLD};
#[cfg(feature = "trace")]
use crate::trace::TraceBuffers;

/// Acquisition state of the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    /// Correlating for the PN preamble
    SeekPn,
    /// Collecting header symbols
    RxHeader,
    /// Collecting payload symbols
    RxPayload,
    /// Reopening loop bandwidths before the next acquisition
    Reset,
}

impl AcquisitionState {
    /// Symbol-accumulator capacity in this state.
    pub fn capacity(self) -> usize {
        match self {
            AcquisitionState::SeekPn | AcquisitionState::Reset => 0,
            AcquisitionState::RxHeader => FrameLayout::HEADER_SYMBOLS,
            AcquisitionState::RxPayload => FrameLayout::PAYLOAD_SYMBOLS,
        }
    }
}

/// Active loop-bandwidth preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Wide bandwidths for acquisition
    Acquisition,
    /// Narrow bandwidths for tracking
    Tracking,
}

/// One recovered frame, delivered synchronously from `execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Decoded user header; bytes [24..28) carry the payload CRC key
    pub header: [u8; FrameLayout::HEADER_USER_BYTES],
    /// Header CRC32 check result
    pub header_valid: bool,
    /// Decoded payload
    pub payload: [u8; FrameLayout::PAYLOAD_BYTES],
    /// Payload CRC32 check result
    pub payload_valid: bool,
}

/// Streaming frame synchronizer.
///
/// Single-threaded and cooperative: one instance owns its DSP objects and
/// processes one sample stream in the caller's thread. The sample path
/// performs no allocation; all buffers are sized at construction.
pub struct FrameSynchronizer<F: FnMut(FrameReport)> {
    props: SyncProperties,

    // synchronizer objects
    agc: Agc,
    symsync: SymSync,
    pll: Pll,
    nco: Nco,
    psync: BinarySync,
    demod_bpsk: Demodulator,
    demod_qpsk: Demodulator,
    deintlv: BlockInterleaver,

    // status
    state: AcquisitionState,
    regime: Regime,
    collected: usize,
    rssi: f32,
    squelch_timer: u32,

    // symbol accumulators and decode scratch
    header_sym: [u8; FrameLayout::HEADER_SYMBOLS],
    payload_sym: [u8; FrameLayout::PAYLOAD_SYMBOLS],
    header: [u8; FrameLayout::HEADER_BYTES],
    payload: [u8; FrameLayout::PAYLOAD_BYTES],
    header_key: u32,
    payload_key: u32,
    header_valid: bool,
    payload_valid: bool,

    sym_out: Vec<Complex32>,
    log: EventLog,
    #[cfg(feature = "trace")]
    trace: TraceBuffers,

    callback: F,
}

impl<F: FnMut(FrameReport)> FrameSynchronizer<F> {
    /// Build a synchronizer from validated properties and a frame callback.
    pub fn new(props: SyncProperties, callback: F) -> Result<Self, ConfigError> {
        props.validate()?;

        let mut agc = Agc::new(1.0, props.agc_bw0);
        agc.set_gain_limits(1e-6, 1e2);

        let symsync = SymSync::new(
            MatchedFilter::K,
            MatchedFilter::NPFB,
            MatchedFilter::M,
            MatchedFilter::BETA,
        );

        let mut sync = Self {
            squelch_timer: props.squelch_timeout,
            props,
            agc,
            symsync,
            pll: Pll::new(2e-3),
            nco: Nco::new(),
            psync: BinarySync::new(pn_preamble(FrameLayout::PN_SYMBOLS)),
            demod_bpsk: Demodulator::new(ModulationScheme::Bpsk),
            demod_qpsk: Demodulator::new(ModulationScheme::Qpsk),
            deintlv: BlockInterleaver::new(FrameLayout::PAYLOAD_INTLV_BYTES),
            state: AcquisitionState::SeekPn,
            regime: Regime::Acquisition,
            collected: 0,
            rssi: 0.0,
            header_sym: [0; FrameLayout::HEADER_SYMBOLS],
            payload_sym: [0; FrameLayout::PAYLOAD_SYMBOLS],
            header: [0; FrameLayout::HEADER_BYTES],
            payload: [0; FrameLayout::PAYLOAD_BYTES],
            header_key: 0,
            payload_key: 0,
            header_valid: false,
            payload_valid: false,
            sym_out: Vec::with_capacity(4),
            log: EventLog::default(),
            #[cfg(feature = "trace")]
            trace: TraceBuffers::new(),
            callback,
        };
        sync.open_bandwidth();
        Ok(sync)
    }

    /// Process a block of baseband samples at k=2 samples per symbol.
    pub fn execute(&mut self, samples: &[Complex32]) {
        for &x in samples {
            let y = self.agc.execute(x);
            self.rssi = self.agc.rssi_db();

            #[cfg(feature = "trace")]
            {
                self.trace.input.push(x);
                self.trace.level.push(self.agc.signal_level());
                self.trace.agc_out.push(y);
            }

            // squelch: gate the synchronizer only while seeking and only
            // after the signal has stayed below threshold for the timeout
            if self.state == AcquisitionState::SeekPn && self.rssi < self.props.squelch_threshold {
                if self.squelch_timer > 1 {
                    self.squelch_timer -= 1;
                } else if self.squelch_timer == 1 {
                    self.squelch_timer = 0;
                    self.soft_reset();
                }
                continue;
            }
            self.squelch_timer = self.props.squelch_timeout;

            let mut out = mem::take(&mut self.sym_out);
            self.symsync.execute(y, &mut out);
            for &symbol in &out {
                self.process_symbol(symbol);
            }
            out.clear();
            self.sym_out = out;
        }
    }

    fn process_symbol(&mut self, symbol: Complex32) {
        let z = self.nco.mix_down(symbol);
        let (decision, phase_error) = {
            let demod = if self.state == AcquisitionState::SeekPn {
                &mut self.demod_bpsk
            } else {
                &mut self.demod_qpsk
            };
            let decision = demod.demodulate(z);
            (decision, demod.phase_error())
        };
        self.pll.step(&mut self.nco, phase_error);
        self.nco.step();

        #[cfg(feature = "trace")]
        {
            self.trace.nco_out.push(z);
            self.trace.nco_phase.push(self.nco.phase());
            self.trace.nco_freq.push(self.nco.frequency());
        }

        if self.rssi < self.props.squelch_threshold {
            return;
        }

        self.state = match self.state {
            AcquisitionState::SeekPn => self.seek_preamble(z),
            AcquisitionState::RxHeader => self.collect_header(decision),
            AcquisitionState::RxPayload => self.collect_payload(decision),
            AcquisitionState::Reset => self.reopen(),
        };
    }

    fn seek_preamble(&mut self, z: Complex32) -> AcquisitionState {
        let rxy = self.psync.correlate(z);
        #[cfg(feature = "trace")]
        self.trace.rxy.push(rxy.abs());

        if rxy.abs() > PN_DETECT_THRESHOLD {
            self.pll.reset();
            self.close_bandwidth();
            let rxy_arg = if rxy >= 0.0 { 0.0 } else { PI };
            self.nco.adjust_phase(PI - rxy_arg);
            self.log
                .info("SYNC", format_args!("preamble found, |rxy| = {:.3}", rxy.abs()));
            AcquisitionState::RxHeader
        } else {
            AcquisitionState::SeekPn
        }
    }

    fn collect_header(&mut self, decision: u8) -> AcquisitionState {
        self.header_sym[self.collected] = decision;
        self.collected += 1;
        if self.collected < FrameLayout::HEADER_SYMBOLS {
            return AcquisitionState::RxHeader;
        }
        self.collected = 0;
        self.decode_header();
        AcquisitionState::RxPayload
    }

    fn collect_payload(&mut self, decision: u8) -> AcquisitionState {
        self.payload_sym[self.collected] = decision;
        self.collected += 1;
        if self.collected < FrameLayout::PAYLOAD_SYMBOLS {
            return AcquisitionState::RxPayload;
        }
        self.collected = 0;
        self.decode_payload();

        let mut header = [0u8; FrameLayout::HEADER_USER_BYTES];
        header.copy_from_slice(&self.header[..FrameLayout::HEADER_USER_BYTES]);
        (self.callback)(FrameReport {
            header,
            header_valid: self.header_valid,
            payload: self.payload,
            payload_valid: self.payload_valid,
        });
        AcquisitionState::Reset
    }

    fn reopen(&mut self) -> AcquisitionState {
        self.open_bandwidth();
        self.pll.reset();
        self.nco.reset();
        self.collected = 0;
        self.log.debug("SYNC", "reacquiring");
        AcquisitionState::SeekPn
    }

    fn decode_header(&mut self) {
        let mut enc = [0u8; FrameLayout::HEADER_ENC_BYTES];
        for (byte, chunk) in enc.iter_mut().zip(self.header_sym.chunks_exact(4)) {
            *byte = pack_symbols(chunk);
        }
        coding::fec_decode(&enc, &mut self.header);
        coding::scramble(&mut self.header);

        let h = &self.header;
        self.header_key = u32::from_be_bytes([h[28], h[29], h[30], h[31]]);
        self.payload_key = u32::from_be_bytes([h[24], h[25], h[26], h[27]]);
        self.header_valid =
            coding::validate(&self.header[..FrameLayout::HEADER_KEY_OFFSET], self.header_key);
        self.log.info(
            "FRAME",
            format_args!("header {}", if self.header_valid { "ok" } else { "invalid" }),
        );
    }

    fn decode_payload(&mut self) {
        let mut intlv = [0u8; FrameLayout::PAYLOAD_INTLV_BYTES];
        for (byte, chunk) in intlv.iter_mut().zip(self.payload_sym.chunks_exact(4)) {
            *byte = pack_symbols(chunk);
        }
        let mut enc = [0u8; FrameLayout::PAYLOAD_INTLV_BYTES];
        self.deintlv.deinterleave(&intlv, &mut enc);
        coding::fec_decode(&enc, &mut self.payload);
        coding::scramble(&mut self.payload);

        self.payload_valid = coding::validate(&self.payload, self.payload_key);
        self.log.info(
            "FRAME",
            format_args!("payload {}", if self.payload_valid { "ok" } else { "invalid" }),
        );
    }

    /// Apply the wide acquisition presets to AGC, symsync, and PLL.
    fn open_bandwidth(&mut self) {
        self.agc.set_bandwidth(self.props.agc_bw0);
        self.symsync.set_loop_bandwidth(self.props.sym_bw0);
        self.pll.set_bandwidth(self.props.pll_bw0);
        self.regime = Regime::Acquisition;
    }

    /// Apply the narrow tracking presets to AGC, symsync, and PLL.
    fn close_bandwidth(&mut self) {
        self.agc.set_bandwidth(self.props.agc_bw1);
        self.symsync.set_loop_bandwidth(self.props.sym_bw1);
        self.pll.set_bandwidth(self.props.pll_bw1);
        self.regime = Regime::Tracking;
    }

    /// Clear the signal path without leaving the current state: zero the
    /// symsync taps, reset the PLL filter, reopen the loop bandwidths, and
    /// zero the NCO.
    fn soft_reset(&mut self) {
        self.symsync.clear();
        self.pll.reset();
        self.open_bandwidth();
        self.nco.reset();
        self.log.debug("SQUELCH", "signal lost, soft reset");
    }

    /// Soft reset plus a return to acquisition.
    pub fn reset(&mut self) {
        self.soft_reset();
        self.state = AcquisitionState::SeekPn;
        self.collected = 0;
        self.squelch_timer = self.props.squelch_timeout;
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn rssi_db(&self) -> f32 {
        self.rssi
    }

    /// Tracked carrier offset in radians per symbol.
    pub fn carrier_frequency(&self) -> f32 {
        self.nco.frequency()
    }

    pub fn properties(&self) -> &SyncProperties {
        &self.props
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    #[cfg(feature = "trace")]
    pub fn trace(&self) -> &TraceBuffers {
        &self.trace
    }

    /// Configure a file the trace rings are dumped to when the
    /// synchronizer is dropped.
    #[cfg(feature = "trace")]
    pub fn set_trace_path(&mut self, path: Option<std::path::PathBuf>) {
        self.trace.set_dump_path(path);
    }
}

impl<F: FnMut(FrameReport)> fmt::Display for FrameSynchronizer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "framesync:")?;
        writeln!(f, "  state     : {:?} ({:?})", self.state, self.regime)?;
        writeln!(f, "  rssi      : {:8.2} dB", self.rssi)?;
        writeln!(
            f,
            "  collected : {}/{}",
            self.collected,
            self.state.capacity()
        )?;
        writeln!(f, "  nco freq  : {:11.3e} rad/symbol", self.nco.frequency())
    }
}

#[cfg(feature = "trace")]
impl<F: FnMut(FrameReport)> Drop for FrameSynchronizer<F> {
    fn drop(&mut self) {
        let Some(path) = self.trace.dump_path().cloned() else {
            return;
        };
        match std::fs::File::create(&path) {
            Ok(mut file) => {
                if let Err(err) = self.trace.write_script(&mut file) {
                    self.log.warn("TRACE", format_args!("dump failed: {err}"));
                }
            }
            Err(err) => self.log.warn("TRACE", format_args!("dump failed: {err}")),
        }
    }
}
