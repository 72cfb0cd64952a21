//! Framelock error types with granular categories

use thiserror::Error;

/// Top-level error type for all framelock operations
#[derive(Debug, Error)]
pub enum FramelockError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Domain violations in the pure numerical kernels
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DomainError {
    #[error("elliptic modulus {k} outside [0, 1)")]
    InvalidModulus { k: f32 },

    #[error("filter selectivity {n} must be finite and positive")]
    InvalidSelectivity { n: f32 },
}

/// Configuration errors from the synchronizer property surface
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} = {value} outside (0, 1)")]
    InvalidBandwidth { name: &'static str, value: f32 },

    #[error("squelch threshold {threshold_db} dB is not finite")]
    InvalidSquelchThreshold { threshold_db: f32 },

    #[error("squelch timeout must be at least 1 sample")]
    InvalidSquelchTimeout,
}

/// Result type alias for framelock operations
pub type Result<T> = std::result::Result<T, FramelockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_component_errors() {
        let err: FramelockError = DomainError::InvalidModulus { k: 1.5 }.into();
        assert!(err.to_string().contains("elliptic modulus"));

        let err: FramelockError = ConfigError::InvalidSquelchTimeout.into();
        assert!(err.to_string().contains("squelch timeout"));
    }
}
