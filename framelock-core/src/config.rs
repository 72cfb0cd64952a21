//! Configuration types for the frame synchronizer.
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Loop-bandwidth and squelch property surface of the synchronizer.
///
/// The `*_bw0` values are the wide acquisition presets, the `*_bw1` values
/// the narrow tracking presets. Exactly one preset set is applied to the
/// three loops at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProperties {
    /// AGC bandwidth in the acquisition regime
    pub agc_bw0: f32,
    /// AGC bandwidth in the tracking regime
    pub agc_bw1: f32,
    /// Symbol-synchronizer loop bandwidth, acquisition regime
    pub sym_bw0: f32,
    /// Symbol-synchronizer loop bandwidth, tracking regime
    pub sym_bw1: f32,
    /// Carrier-recovery PLL bandwidth, acquisition regime
    pub pll_bw0: f32,
    /// Carrier-recovery PLL bandwidth, tracking regime
    pub pll_bw1: f32,
    /// RSSI floor in dB for acquisition gating
    pub squelch_threshold: f32,
    /// Consecutive low-RSSI sample count before soft reset
    pub squelch_timeout: u32,
}

impl Default for SyncProperties {
    fn default() -> Self {
        Self {
            agc_bw0: 3e-3,
            agc_bw1: 1e-5,
            sym_bw0: 1e-2,
            sym_bw1: 1e-3,
            pll_bw0: 2e-3,
            pll_bw1: 1e-3,
            squelch_threshold: -15.0,
            squelch_timeout: 32,
        }
    }
}

impl SyncProperties {
    /// Validate every property against its admissible range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bandwidths = [
            ("agc_bw0", self.agc_bw0),
            ("agc_bw1", self.agc_bw1),
            ("sym_bw0", self.sym_bw0),
            ("sym_bw1", self.sym_bw1),
            ("pll_bw0", self.pll_bw0),
            ("pll_bw1", self.pll_bw1),
        ];
        for (name, value) in bandwidths {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(ConfigError::InvalidBandwidth { name, value });
            }
        }
        if !self.squelch_threshold.is_finite() {
            return Err(ConfigError::InvalidSquelchThreshold {
                threshold_db: self.squelch_threshold,
            });
        }
        if self.squelch_timeout == 0 {
            return Err(ConfigError::InvalidSquelchTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_properties_are_valid() {
        assert!(SyncProperties::default().validate().is_ok());
    }

    #[test]
    fn default_presets_match_wire_constants() {
        let props = SyncProperties::default();
        assert_eq!(props.agc_bw0, 3e-3);
        assert_eq!(props.agc_bw1, 1e-5);
        assert_eq!(props.sym_bw0, 1e-2);
        assert_eq!(props.sym_bw1, 1e-3);
        assert_eq!(props.pll_bw0, 2e-3);
        assert_eq!(props.pll_bw1, 1e-3);
        assert_eq!(props.squelch_threshold, -15.0);
        assert_eq!(props.squelch_timeout, 32);
    }

    #[test]
    fn rejects_out_of_range_bandwidth() {
        let mut props = SyncProperties::default();
        props.pll_bw1 = 0.0;
        assert!(matches!(
            props.validate(),
            Err(ConfigError::InvalidBandwidth { name: "pll_bw1", .. })
        ));

        props = SyncProperties::default();
        props.agc_bw0 = 1.5;
        assert!(props.validate().is_err());
    }

    #[test]
    fn rejects_zero_squelch_timeout() {
        let mut props = SyncProperties::default();
        props.squelch_timeout = 0;
        assert_eq!(props.validate(), Err(ConfigError::InvalidSquelchTimeout));
    }
}
