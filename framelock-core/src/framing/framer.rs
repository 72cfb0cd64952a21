//! Transmit-side frame generator
//!
//! Produces the complex baseband sample stream for one frame: the 64-chip PN
//! preamble, 256 QPSK header symbols, and 512 QPSK payload symbols, pulse
//! shaped at two samples per symbol through the same root-raised-cosine
//! filter the receiver matches against.

use num_complex::Complex32;

use crate::coding::{self, BlockInterleaver};
use crate::dsp::{pn_preamble, Interpolator, ModulationScheme, Modulator};
use crate::protocol::{unpack_byte, FrameLayout, MatchedFilter};

/// Frame generator with persistent pulse-shaping state.
pub struct FrameGenerator {
    qpsk: Modulator,
    interp: Interpolator,
    pn: Vec<f32>,
    intlv: BlockInterleaver,
}

impl FrameGenerator {
    pub fn new() -> Self {
        Self {
            qpsk: Modulator::new(ModulationScheme::Qpsk),
            interp: Interpolator::new(MatchedFilter::K, MatchedFilter::M, MatchedFilter::BETA),
            pn: pn_preamble(FrameLayout::PN_SYMBOLS),
            intlv: BlockInterleaver::new(FrameLayout::PAYLOAD_INTLV_BYTES),
        }
    }

    /// Samples produced per call to [`generate`](Self::generate).
    pub fn frame_sample_len(&self) -> usize {
        MatchedFilter::K * FrameLayout::TOTAL_SYMBOLS + 2 * MatchedFilter::K * MatchedFilter::M
    }

    /// Build one frame from 24 user header bytes and a 64-byte payload.
    ///
    /// Header bytes [24..28) carry the payload CRC32 key and [28..32) the
    /// header CRC32 key, both big endian.
    pub fn generate(
        &mut self,
        user_header: &[u8; FrameLayout::HEADER_INPUT_BYTES],
        payload: &[u8; FrameLayout::PAYLOAD_BYTES],
    ) -> Vec<Complex32> {
        let mut header = [0u8; FrameLayout::HEADER_BYTES];
        header[..FrameLayout::HEADER_INPUT_BYTES].copy_from_slice(user_header);
        let payload_key = coding::checksum(payload);
        header[FrameLayout::PAYLOAD_KEY_OFFSET..FrameLayout::HEADER_KEY_OFFSET]
            .copy_from_slice(&payload_key.to_be_bytes());
        let header_key = coding::checksum(&header[..FrameLayout::HEADER_KEY_OFFSET]);
        header[FrameLayout::HEADER_KEY_OFFSET..].copy_from_slice(&header_key.to_be_bytes());

        coding::scramble(&mut header);
        let mut header_enc = [0u8; FrameLayout::HEADER_ENC_BYTES];
        coding::fec_encode(&header, &mut header_enc);

        let mut payload_raw = *payload;
        coding::scramble(&mut payload_raw);
        let mut payload_enc = [0u8; FrameLayout::PAYLOAD_INTLV_BYTES];
        coding::fec_encode(&payload_raw, &mut payload_enc);
        let mut payload_intlv = [0u8; FrameLayout::PAYLOAD_INTLV_BYTES];
        self.intlv.interleave(&payload_enc, &mut payload_intlv);

        let mut samples = Vec::with_capacity(self.frame_sample_len());
        for &chip in &self.pn {
            self.interp.execute(Complex32::new(chip, 0.0), &mut samples);
        }
        self.shape_bytes(&header_enc, &mut samples);
        self.shape_bytes(&payload_intlv, &mut samples);
        self.interp.flush(&mut samples);
        samples
    }

    fn shape_bytes(&mut self, bytes: &[u8], samples: &mut Vec<Complex32>) {
        for &byte in bytes {
            for symbol in unpack_byte(byte) {
                // data symbols ride pi radians from the demod constellation;
                // the receiver's pi - arg(rxy) rotation lands them upright
                let point = -self.qpsk.modulate(symbol);
                self.interp.execute(point, samples);
            }
        }
    }
}

impl Default for FrameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_has_expected_length() {
        let mut framer = FrameGenerator::new();
        let header = [0u8; 24];
        let payload = [0u8; 64];
        let samples = framer.generate(&header, &payload);
        assert_eq!(samples.len(), framer.frame_sample_len());
        assert_eq!(samples.len(), 1676);
    }

    #[test]
    fn preamble_region_is_real_valued() {
        let mut framer = FrameGenerator::new();
        let samples = framer.generate(&[0u8; 24], &[0u8; 64]);
        // after the shaping transient, the PN region carries no quadrature
        for s in &samples[16..120] {
            assert!(
                s.im.abs() < 1e-4,
                "quadrature leakage {} in preamble",
                s.im
            );
        }
    }

    #[test]
    fn distinct_payloads_give_distinct_streams() {
        let mut framer = FrameGenerator::new();
        let a = framer.generate(&[0u8; 24], &[0u8; 64]);
        let b = framer.generate(&[0u8; 24], &[1u8; 64]);
        assert_ne!(a, b);
        // same inputs reproduce the same stream
        let c = framer.generate(&[0u8; 24], &[0u8; 64]);
        assert_eq!(a, c);
    }
}
