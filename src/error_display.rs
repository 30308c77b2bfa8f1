//! User-facing error message formatting.

use polars::prelude::PolarsError;

use crate::error::PresetError;

/// Format a PolarsError raised while filtering as a short message for the grid.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!(
            "Column not found: {}. Presets may only filter on name, artist or year.",
            msg
        ),
        PE::SchemaMismatch(msg) => format!("Value does not fit the column type: {}", msg),
        PE::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PE::ComputeError(msg) => msg.lines().next().unwrap_or_default().to_string(),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format a refused preset operation for the status line.
pub fn user_message_from_preset(err: &PresetError) -> String {
    match err {
        PresetError::Validation(msg) => {
            let mut chars = msg.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        PresetError::Index { index, len } if *len == 0 => {
            format!("No preset {} (there are no presets)", index)
        }
        PresetError::Index { index, len } => {
            format!("No preset {} (choose 0 to {} or None)", index, len - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_messages() {
        assert_eq!(
            user_message_from_preset(&PresetError::Validation(
                "preset name must not be empty".to_string()
            )),
            "Preset name must not be empty"
        );
        assert_eq!(
            user_message_from_preset(&PresetError::Index { index: 5, len: 3 }),
            "No preset 5 (choose 0 to 2 or None)"
        );
        assert_eq!(
            user_message_from_preset(&PresetError::Index { index: 0, len: 0 }),
            "No preset 0 (there are no presets)"
        );
    }

    #[test]
    fn test_column_not_found_message() {
        let err = PolarsError::ColumnNotFound("genre".into());
        assert!(user_message_from_polars(&err).starts_with("Column not found: genre"));
    }
}
