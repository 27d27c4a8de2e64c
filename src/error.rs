//! Lineage tracker error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineageError {
    #[error("Invalid node reference: {node} (population size {population})")]
    InvalidReference { node: usize, population: usize },

    #[error("Lineage graph invariant violated: {reason}")]
    GraphInvariantViolation { reason: String },

    #[error("Lineage graph is empty")]
    EmptyGraph,

    #[error("Configuration error: {reason}")]
    ConfigurationError { reason: String },

    #[error("Invalid individual record: {reason}")]
    InvalidRecord { reason: String },
}

pub type LineageResult<T> = std::result::Result<T, LineageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reference_message() {
        let error = LineageError::InvalidReference {
            node: 7,
            population: 3,
        };
        assert_eq!(
            error.to_string(),
            "Invalid node reference: 7 (population size 3)"
        );
    }

    #[test]
    fn test_configuration_error_message() {
        let error = LineageError::ConfigurationError {
            reason: "Unsupported layout: sunburst".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration error: Unsupported layout: sunburst"
        );
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(LineageError::EmptyGraph)?;
            Ok(())
        }

        let error = fails().unwrap_err();
        assert!(error.downcast_ref::<LineageError>().is_some());
    }
}
