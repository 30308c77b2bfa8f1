use thiserror::Error;

/// Refusals from the preset store and the selection controller.
///
/// Both kinds are recoverable: the operation is rejected and the prior state
/// is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    /// Input rejected before it could be stored (e.g. an empty preset name).
    #[error("invalid preset: {0}")]
    Validation(String),
    /// A preset index outside `0..len`, or a negative index other than -1.
    #[error("preset index {index} is out of range for {len} presets")]
    Index { index: i64, len: usize },
}

impl PresetError {
    pub fn is_validation(&self) -> bool {
        matches!(self, PresetError::Validation(_))
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PresetError::Index { .. })
    }
}

pub type Result<T> = std::result::Result<T, PresetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PresetError::Validation("preset name must not be empty".to_string());
        assert_eq!(err.to_string(), "invalid preset: preset name must not be empty");
        assert!(err.is_validation());

        let err = PresetError::Index { index: 7, len: 3 };
        assert_eq!(err.to_string(), "preset index 7 is out of range for 3 presets");
        assert!(err.is_index());
    }
}
