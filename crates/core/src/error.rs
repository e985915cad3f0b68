/// Rejected configuration. Raised only at construction time; a detector that
/// was built successfully never fails on bad settings later.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
}

/// Checks that a ratio-style setting lies within `[0, 1]`.
pub(crate) fn unit_range(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

pub(crate) fn non_zero<T: Default + PartialEq>(name: &'static str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        Err(ConfigError::Zero(name))
    } else {
        Ok(value)
    }
}
