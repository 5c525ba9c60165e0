use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrainError::ConfigError("Learning rate must be greater than 0.0".to_string());
        assert_eq!(err.to_string(), "Configuration error: Learning rate must be greater than 0.0");

        let err = TrainError::IoError("Failed to open file".to_string());
        assert_eq!(err.to_string(), "I/O error: Failed to open file");
    }
}
