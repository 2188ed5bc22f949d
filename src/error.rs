use thiserror::Error;

use crate::domain::TurbineId;

/// Errors reported by a [`TelemetrySink`](crate::repo::TelemetrySink) implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SinkError {
    #[error("Telemetry sink unavailable: {0}")]
    Unavailable(String),

    #[error("Telemetry sink backend error: {0}")]
    Backend(String),

    #[error("Unknown turbine: {0}")]
    UnknownTurbine(TurbineId),
}

/// Engine-level error taxonomy.
///
/// `Configuration` is raised while building tables or loading settings and is
/// never recovered. `NotFound` and `Sink` are reported to control-path callers;
/// the background workers only log them.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }

    /// Stable identifier used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Configuration(_) => "ConfigurationError",
            EngineError::NotFound(_) => "NotFoundError",
            EngineError::Sink(_) => "SinkError",
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EngineError::Configuration(errors.to_string())
    }
}

impl From<figment::Error> for EngineError {
    fn from(error: figment::Error) -> Self {
        EngineError::Configuration(error.to_string())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            EngineError::configuration("bad table").kind(),
            "ConfigurationError"
        );
        assert_eq!(
            EngineError::NotFound("scenario 9".to_string()).kind(),
            "NotFoundError"
        );
        assert_eq!(
            EngineError::from(SinkError::Unavailable("down".to_string())).kind(),
            "SinkError"
        );
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::NotFound("scenario 42".to_string());
        assert_eq!(error.to_string(), "Resource not found: scenario 42");

        let error = EngineError::from(SinkError::Backend("disk full".to_string()));
        assert_eq!(error.to_string(), "Telemetry sink backend error: disk full");
    }
}
