//! Error types for the signflow crate

use thiserror::Error;

/// Signflow errors
#[derive(Error, Debug, Clone)]
pub enum SignflowError {
    /// Shape or tone classifier failure during inference
    #[error("Classifier error: {0}")]
    ClassifierError(String),

    /// Model artifact missing or failed to load
    #[error("Model load error: {0}")]
    ModelLoadError(String),

    /// Hand tracker produced an observation we cannot use
    #[error("Tracking error: {0}")]
    TrackingError(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for SignflowError {
    fn from(e: std::io::Error) -> Self {
        SignflowError::IOError(e.to_string())
    }
}

impl SignflowError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors let the per-frame loop continue; non-recoverable
    /// errors require user intervention or a restart.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Inference errors are treated as "no result this frame"
            SignflowError::ClassifierError(_) => true,
            // A missing model artifact cannot heal at runtime
            SignflowError::ModelLoadError(_) => false,
            // Malformed observations are corrected and skipped
            SignflowError::TrackingError(_) => true,
            // Channel errors indicate internal issues
            SignflowError::ChannelError(_) => false,
            // Config errors require user intervention
            SignflowError::ConfigError(_) => false,
            // IO errors may require user intervention
            SignflowError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            SignflowError::ClassifierError(_) => {
                "Recognition failed for this frame. Please try again.".to_string()
            }
            SignflowError::ModelLoadError(_) => {
                "A recognition model could not be loaded. Please check the model files.".to_string()
            }
            SignflowError::TrackingError(_) => {
                "Hand tracking produced unusable data. Please adjust your hand position.".to_string()
            }
            SignflowError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            SignflowError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            SignflowError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

/// Result type alias for signflow operations
pub type Result<T> = std::result::Result<T, SignflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(SignflowError::ClassifierError("x".into()).is_recoverable());
        assert!(SignflowError::TrackingError("x".into()).is_recoverable());
        assert!(!SignflowError::ModelLoadError("x".into()).is_recoverable());
        assert!(!SignflowError::ConfigError("x".into()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SignflowError = io.into();
        assert!(matches!(err, SignflowError::IOError(_)));
    }

    #[test]
    fn test_display_includes_context() {
        let err = SignflowError::ClassifierError("bad tensor".into());
        assert!(err.to_string().contains("bad tensor"));
    }
}
