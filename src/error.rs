use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the molecule simulation core.
///
/// Each variant carries enough context to be actionable. `StepLimitExceeded` is the
/// only recoverable kind: the advancer reports it alongside a valid state instead of
/// returning it as `Err`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Atom count outside the supported molecule sizes.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Non-physical parameter or malformed API input.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Integration step that is not a positive finite number.
    #[error("invalid step size: {0}")]
    InvalidStep(f64),

    /// Sub-step loop or collision search hit its iteration cap.
    #[error("step limit exceeded after {sub_steps} sub-steps at t={time}")]
    StepLimitExceeded { sub_steps: usize, time: f64 },

    /// Entity already registered in the `SimList`.
    #[error("entity {0} is already registered")]
    DuplicateEntity(String),

    /// Entity not present in the `SimList`.
    #[error("entity {0} is not registered")]
    UnknownEntity(String),

    /// Malformed configuration document.
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_errors_name_the_entity() {
        assert_eq!(
            Error::DuplicateEntity("SPECIAL1-2".into()).to_string(),
            "entity SPECIAL1-2 is already registered"
        );
        assert_eq!(
            Error::UnknownEntity("WALL_TOP".into()).to_string(),
            "entity WALL_TOP is not registered"
        );
        let e = Error::InvalidConfig("atom count must be in 2..=6, got 7".into());
        assert_eq!(e.to_string(), "invalid configuration: atom count must be in 2..=6, got 7");
    }

    #[test]
    fn step_limit_mentions_count() {
        let e = Error::StepLimitExceeded {
            sub_steps: 42,
            time: 1.5,
        };
        let msg = e.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn json_errors_become_config_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(Error::from(err), Error::Config(_)));
    }
}
